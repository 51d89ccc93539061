//! `help [command]`: list commands, or show one command's help.

use async_trait::async_trait;

use super::{Command, CommandContext, CommandError, CommandRegistry};
use crate::messages::Embed;

pub struct HelpCommand;

/// Listing of every registered command with its usage line.
pub fn render_command_list(registry: &CommandRegistry, prefix: &str) -> Embed {
    Embed::new()
        .title("Commands")
        .description(format!("Use {prefix}help <command> for details"))
        .fields(registry.commands().iter().map(|c| {
            let usage = c.usage();
            let synopsis = if usage.is_empty() {
                format!("{prefix}{}", c.name())
            } else {
                format!("{prefix}{} {usage}", c.name())
            };
            (c.name(), format!("{}\n{synopsis}", c.description()))
        }))
        .timestamped()
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Lists commands"
    }

    fn usage(&self) -> &'static str {
        "[command]"
    }

    fn requires_args(&self) -> bool {
        false
    }

    fn help(&self, prefix: &str) -> Embed {
        render_command_list(&CommandRegistry::with_builtin_commands(), prefix)
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let topic = ctx.invocation.verb().to_lowercase();
        let embed = match ctx.registry.get(&topic) {
            Some(command) if command.name() != self.name() => command.help(ctx.prefix()),
            _ => render_command_list(&ctx.registry, ctx.prefix()),
        };
        ctx.reply_embed(embed).await;
        Ok(())
    }
}
