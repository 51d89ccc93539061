//! In-memory chat surface that records every reply.
//!
//! Used by tests and by dry runs that want to inspect replies instead of
//! delivering them.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::channels::{ChannelError, ChatSurface};
use crate::messages::MessageContent;
use crate::roster::RosterMember;

/// A reply captured by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub channel_id: String,
    pub content: MessageContent,
}

#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<SentMessage>>,
    members: Vec<RosterMember>,
    members_error: Option<ChannelError>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this roster from [`ChatSurface::list_members`].
    pub fn with_members(mut self, members: Vec<RosterMember>) -> Self {
        self.members = members;
        self
    }

    /// Fail every member listing with `error`.
    pub fn with_members_error(mut self, error: ChannelError) -> Self {
        self.members_error = Some(error);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Text of every plain-text reply, in send order.
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| m.content.as_text().map(str::to_string))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

#[async_trait]
impl ChatSurface for RecordingChannel {
    async fn send(&self, channel_id: &str, content: MessageContent) -> Result<(), ChannelError> {
        self.sent.lock().push(SentMessage {
            channel_id: channel_id.to_string(),
            content,
        });
        Ok(())
    }

    async fn list_members(&self, _guild_id: &str) -> Result<Vec<RosterMember>, ChannelError> {
        match &self.members_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.members.clone()),
        }
    }
}
