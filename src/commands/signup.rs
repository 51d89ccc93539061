//! `signup <clan name>, <leader>`: register the server's clan.

use async_trait::async_trait;
use serde::Deserialize;

use super::{require, Command, CommandContext, CommandError};
use super::{RequiredField, WebRequest};
use crate::messages::{Embed, BLANK_FIELD};

pub const PLUGIN_HUB_URL: &str = "https://runelite.net/plugin-hub/show/clanmate-export";

const SIGNUP_FIELDS: &[RequiredField] = &[
    RequiredField::labeled("name", "Clan Name"),
    RequiredField::unlabeled("discordId"),
    RequiredField::unlabeled("discordIdOfCreator"),
    RequiredField::labeled("runescapeUserName", "Runescape username"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub link: String,
}

pub struct SignupCommand;

pub fn render_signup(clan_name: &str, response: &SignupResponse) -> Embed {
    Embed::new()
        .title(format!("Successfully signed up the clan {clan_name}"))
        .description(format!(
            "Link to set in Clanmate Export Plugin: {}",
            response.link
        ))
        .field("Runelite Plugin link", PLUGIN_HUB_URL)
        .timestamped()
}

#[async_trait]
impl Command for SignupCommand {
    fn name(&self) -> &'static str {
        "signup"
    }

    fn description(&self) -> &'static str {
        "sign up to start tracking"
    }

    fn usage(&self) -> &'static str {
        "<clan name>, <clan leader>"
    }

    fn help(&self, prefix: &str) -> Embed {
        Embed::new()
            .title("Sign up your clan with Runelite!")
            .description(format!("{prefix}signup command help"))
            .field(BLANK_FIELD, BLANK_FIELD)
            .field(
                "Example usage",
                format!("{prefix}signup <clan name>, <clan leader>"),
            )
            .field(BLANK_FIELD, BLANK_FIELD)
            .field("What next?", "We will handle the rest!")
            .timestamped()
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let inv = &ctx.invocation;
        let request = WebRequest::new()
            .optional("name", inv.arg(0))
            .field("discordId", inv.guild_id.as_str())
            .field("discordIdOfCreator", inv.author_id.as_str())
            .optional("runescapeUserName", inv.arg(1));
        require(&request, SIGNUP_FIELDS)?;

        let response: SignupResponse = ctx
            .backend()
            .post_json("api/clan/signup", &request, &ctx.auth())
            .await?;
        ctx.reply_embed(render_signup(&request.text("name"), &response))
            .await;
        Ok(())
    }
}
