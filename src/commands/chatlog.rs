//! `chatlog list, <count>`: recent in-game clan chat.

use async_trait::async_trait;
use serde::Deserialize;

use super::{help_embed, require, whole_number, Command, CommandContext, CommandError};
use super::{RequiredField, WebRequest};
use crate::messages::{paginate_code_block, Embed};

/// One logged chat line.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatLogEntry {
    pub time_sent: String,
    pub sender: String,
    pub message: String,
}

const LIST_FIELDS: &[RequiredField] = &[RequiredField::labeled("count", "Message count")];

/// Sent when the backend has no chat lines to show.
pub const EMPTY_CHAT_LOG: &str = "No chat messages have been logged yet.";

pub struct ChatLogCommand;

/// Oldest-first transcript of `entries`, which arrive newest first.
pub fn render_chat_log(mut entries: Vec<ChatLogEntry>) -> String {
    entries.reverse();
    entries
        .iter()
        .map(|e| format!("{} {}: {} \n", e.time_sent, e.sender, e.message))
        .collect()
}

#[async_trait]
impl Command for ChatLogCommand {
    fn name(&self) -> &'static str {
        "chatlog"
    }

    fn description(&self) -> &'static str {
        "Handles chat logs"
    }

    fn usage(&self) -> &'static str {
        "list, <count>"
    }

    fn help(&self, prefix: &str) -> Embed {
        help_embed(
            "View in game chat logs!",
            format!("{prefix}chatlog command help"),
            &[("list", format!("{prefix}chatlog list, <how many messages>"))],
        )
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let inv = &ctx.invocation;
        if inv.verb() != "list" {
            ctx.reply_embed(self.help(ctx.prefix())).await;
            return Ok(());
        }

        let request = WebRequest::new().optional("count", inv.arg(1));
        require(&request, LIST_FIELDS)?;
        let count = whole_number("Message count", &request.text("count"))?;

        let entries: Vec<ChatLogEntry> = ctx
            .backend()
            .get_json(&format!("api/clan/chatlog/{count}"), &ctx.auth())
            .await?;
        if entries.is_empty() {
            ctx.reply_text(EMPTY_CHAT_LOG).await;
            return Ok(());
        }
        ctx.reply_chunks(paginate_code_block(&render_chat_log(entries)))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: &str, sender: &str, message: &str) -> ChatLogEntry {
        ChatLogEntry {
            time_sent: time.to_string(),
            sender: sender.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_render_oldest_first() {
        let text = render_chat_log(vec![
            entry("12:02", "Woox", "gz"),
            entry("12:01", "Zezima", "hi all"),
        ]);
        assert_eq!(text, "12:01 Zezima: hi all \n12:02 Woox: gz \n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_chat_log(Vec::new()), "");
    }

    #[test]
    fn test_help_mentions_list() {
        let help = ChatLogCommand.help("??");
        assert_eq!(help.title.as_deref(), Some("View in game chat logs!"));
        assert_eq!(help.fields[0].value, "??chatlog list, <how many messages>");
    }
}
