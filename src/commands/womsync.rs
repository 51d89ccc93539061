//! `womsync`: ask the backend to refresh the clan from its Wise Old Man group.

use async_trait::async_trait;

use super::{help_embed, Command, CommandContext, CommandError};
use crate::messages::Embed;

pub struct WomSyncCommand;

#[async_trait]
impl Command for WomSyncCommand {
    fn name(&self) -> &'static str {
        "womsync"
    }

    fn description(&self) -> &'static str {
        "Sync Wise old man group to our service"
    }

    fn usage(&self) -> &'static str {
        ""
    }

    fn requires_args(&self) -> bool {
        false
    }

    fn help(&self, prefix: &str) -> Embed {
        help_embed(
            "Wise Old Man sync",
            self.description().to_string(),
            &[("sync", format!("{prefix}womsync"))],
        )
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let path = format!("api/clan/wom/sync/{}", ctx.invocation.guild_id);
        ctx.backend().get(&path, &ctx.auth()).await?;
        ctx.reply_embed(
            Embed::new()
                .title("Successfully Synced Wise Old Man!")
                .timestamped(),
        )
        .await;
        Ok(())
    }
}
