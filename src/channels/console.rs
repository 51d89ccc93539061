//! Console chat surface.
//!
//! Prints replies to stdout so commands can be exercised against a real
//! backend without a Discord connection. Member listing is not available.

use std::io::Write;

use async_trait::async_trait;

use crate::channels::{ChannelError, ChatSurface};
use crate::messages::MessageContent;
use crate::roster::RosterMember;

/// A chat surface that writes replies to stdout.
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    /// Create a new console channel.
    pub fn new() -> Self {
        Self
    }
}

/// Terminal rendering of one reply.
pub fn render_reply(channel_id: &str, content: &MessageContent) -> String {
    format!("[#{}] {}", channel_id, content.render_plain())
}

#[async_trait]
impl ChatSurface for ConsoleChannel {
    async fn send(&self, channel_id: &str, content: MessageContent) -> Result<(), ChannelError> {
        let rendered = render_reply(channel_id, &content);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", rendered).map_err(|e| ChannelError::Transport(e.to_string()))?;
        tracing::debug!(channel = "console", to = %channel_id, "console reply written");
        Ok(())
    }

    async fn list_members(&self, _guild_id: &str) -> Result<Vec<RosterMember>, ChannelError> {
        Err(ChannelError::Unsupported("member listing"))
    }
}
