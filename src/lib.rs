//! clanbot library
//!
//! Chat command gateway for a clan backend: parses prefixed Discord
//! messages, validates arguments, calls the backend with the caller's
//! identity, and renders replies that fit Discord's limits.

pub mod auth;
pub mod backend;
pub mod channels;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod messages;
pub mod roster;
