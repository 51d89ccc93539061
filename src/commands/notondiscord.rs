//! `notondiscord <group id>`: Wise Old Man group members missing from the
//! Discord server.

use async_trait::async_trait;
use tracing::debug;

use super::{help_embed, require, whole_number, Command, CommandContext, CommandError};
use super::{RequiredField, WebRequest};
use crate::messages::{paginate_plain, Embed};
use crate::roster::{chat_roster_names, diff_rosters};

pub const EVERYONE_PRESENT: &str = "Everyone in the Wise Old Man group is on Discord!";

const GROUP_FIELDS: &[RequiredField] =
    &[RequiredField::labeled("groupId", "Wise Old Man group id")];

pub struct NotOnDiscordCommand;

#[async_trait]
impl Command for NotOnDiscordCommand {
    fn name(&self) -> &'static str {
        "notondiscord"
    }

    fn description(&self) -> &'static str {
        "See who is not on discord vs in game clan list"
    }

    fn usage(&self) -> &'static str {
        "<Wiseoldman Group Id>"
    }

    fn help(&self, prefix: &str) -> Embed {
        help_embed(
            "Missing from Discord",
            self.description().to_string(),
            &[("check", format!("{prefix}notondiscord <Wiseoldman Group Id>"))],
        )
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let inv = &ctx.invocation;
        let request = WebRequest::new().optional("groupId", inv.arg(0));
        require(&request, GROUP_FIELDS)?;
        let group_id = whole_number("Wise Old Man group id", &request.text("groupId"))?;

        let members = ctx.surface.list_members(&inv.guild_id).await?;
        let chat_roster = chat_roster_names(&members);

        let external = ctx
            .wom()
            .group_member_names(&group_id.to_string())
            .await
            .map_err(CommandError::WiseOldMan)?;

        let missing = diff_rosters(&chat_roster, &external);
        debug!(
            target: "commands",
            discord = chat_roster.len(),
            group = external.len(),
            missing = missing.len(),
            "roster diff"
        );
        if missing.is_empty() {
            ctx.reply_text(EVERYONE_PRESENT).await;
            return Ok(());
        }
        ctx.reply_chunks(paginate_plain(&missing.join("\n"))).await;
        Ok(())
    }
}
