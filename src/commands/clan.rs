//! `clan inactive, <days>`: members who have not logged in recently.

use async_trait::async_trait;
use serde::Deserialize;

use super::{help_embed, require, whole_number, Command, CommandContext, CommandError};
use super::{RequiredField, WebRequest};
use crate::messages::{paginate_code_block, Embed};

#[derive(Debug, Clone, Deserialize)]
pub struct InactivePlayer {
    pub username: String,
    pub last_active: String,
}

const INACTIVE_FIELDS: &[RequiredField] = &[RequiredField::labeled("days", "Number of days")];

pub struct ClanCommand;

/// Report listing `players` (newest first from the backend) oldest first,
/// under a header naming the threshold.
pub fn render_inactive(days: u32, mut players: Vec<InactivePlayer>) -> String {
    let mut report =
        format!("Players who have not been on for {days} days \nDate format is mm-dd-yyyy \n \n");
    players.reverse();
    for p in &players {
        report.push_str(&format!("{}: {} \n", p.username, p.last_active));
    }
    report
}

#[async_trait]
impl Command for ClanCommand {
    fn name(&self) -> &'static str {
        "clan"
    }

    fn description(&self) -> &'static str {
        "Handles clan management"
    }

    fn usage(&self) -> &'static str {
        "inactive, <days>"
    }

    fn help(&self, prefix: &str) -> Embed {
        help_embed(
            "Clan management",
            format!("{prefix}clan command help"),
            &[("inactive", format!("{prefix}clan inactive, <how many days back>"))],
        )
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let inv = &ctx.invocation;
        if inv.verb() != "inactive" {
            ctx.reply_embed(self.help(ctx.prefix())).await;
            return Ok(());
        }

        let request = WebRequest::new().optional("days", inv.arg(1));
        require(&request, INACTIVE_FIELDS)?;
        let days = whole_number("Number of days", &request.text("days"))?;

        let players: Vec<InactivePlayer> = ctx
            .backend()
            .get_json(&format!("api/player/inactive/{days}"), &ctx.auth())
            .await?;
        ctx.reply_chunks(paginate_code_block(&render_inactive(days, players)))
            .await;
        Ok(())
    }
}
