//! Per-invocation handler context.

use std::sync::Arc;

use tracing::{error, warn};

use super::error::CommandError;
use super::{CommandRegistry, Invocation};
use crate::auth::AuthContext;
use crate::backend::wom::WiseOldManClient;
use crate::backend::{BackendError, BackendGateway};
use crate::channels::ChatSurface;
use crate::config::BotConfig;
use crate::messages::{Embed, MessageContent};

/// Long-lived clients shared by every invocation.
#[derive(Debug, Clone)]
pub struct Services {
    pub prefix: String,
    pub backend: BackendGateway,
    pub wom: WiseOldManClient,
}

impl Services {
    pub fn from_config(config: &BotConfig) -> Result<Self, BackendError> {
        Ok(Self {
            prefix: config.prefix.clone(),
            backend: BackendGateway::new(&config.api)?,
            wom: WiseOldManClient::new(&config.wise_old_man)?,
        })
    }
}

/// Everything a handler can touch while serving one command.
pub struct CommandContext {
    pub invocation: Invocation,
    pub surface: Arc<dyn ChatSurface>,
    pub services: Arc<Services>,
    pub registry: Arc<CommandRegistry>,
}

impl CommandContext {
    pub fn prefix(&self) -> &str {
        &self.services.prefix
    }

    pub fn backend(&self) -> &BackendGateway {
        &self.services.backend
    }

    pub fn wom(&self) -> &WiseOldManClient {
        &self.services.wom
    }

    /// Identity headers for this invocation.
    pub fn auth(&self) -> AuthContext {
        AuthContext::resolve(&self.invocation)
    }

    /// Send one message to the invoking channel. Delivery failures are logged
    /// and otherwise ignored.
    pub async fn reply(&self, content: MessageContent) {
        if let Err(err) = self
            .surface
            .send(&self.invocation.channel_id, content)
            .await
        {
            warn!(
                target: "commands",
                channel = %self.invocation.channel_id,
                error = %err,
                "failed to deliver reply"
            );
        }
    }

    pub async fn reply_text(&self, text: impl Into<String>) {
        self.reply(MessageContent::text(text)).await;
    }

    pub async fn reply_embed(&self, embed: Embed) {
        self.reply(MessageContent::embed(embed)).await;
    }

    /// Send pre-paginated chunks one after another, in order.
    pub async fn reply_chunks(&self, chunks: Vec<String>) {
        for chunk in chunks {
            self.reply_text(chunk).await;
        }
    }

    /// Tell the user about a failure, one message per reportable item.
    /// Failures without a user-facing message are only logged.
    pub async fn report(&self, err: &CommandError) {
        if !err.is_user_facing() {
            error!(
                target: "commands",
                guild = %self.invocation.guild_id,
                error = %err,
                "command failed"
            );
            return;
        }
        warn!(target: "commands", error = %err, "command rejected");
        for message in err.user_messages() {
            self.reply_text(message).await;
        }
    }
}
