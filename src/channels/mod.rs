//! Chat platform adapters
//!
//! Command handlers talk to the chat platform through [`ChatSurface`]: send a
//! reply to a channel and list the members of a guild. The Discord adapter
//! implements it over the REST API, the console adapter prints to stdout, and
//! the recording adapter captures replies for tests.

pub mod console;
pub mod discord;
pub mod discord_gateway;
pub mod recording;

use async_trait::async_trait;

use crate::messages::MessageContent;
use crate::roster::RosterMember;

/// Errors raised by a chat adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{platform} rejected the request ({status}): {message}")]
    Rejected {
        platform: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0} is not supported by this channel")]
    Unsupported(&'static str),
}

/// Outbound capability handed to command handlers.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Deliver one message to a channel.
    async fn send(&self, channel_id: &str, content: MessageContent) -> Result<(), ChannelError>;

    /// Every member of a guild, bots included.
    async fn list_members(&self, guild_id: &str) -> Result<Vec<RosterMember>, ChannelError>;
}
