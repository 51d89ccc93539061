//! Prefixed chat commands
//!
//! A chat message such as `??donations list, user, Zezima` is split into a
//! command name (`donations`, matched case-insensitively) and comma-separated
//! arguments (`["list", "user", "Zezima"]`, each trimmed). The
//! [`Dispatcher`] looks the name up in the [`CommandRegistry`], renders the
//! command's help when it needs arguments and got none (or got `help`), and
//! otherwise runs the handler. Handler failures are turned into chat replies
//! according to [`CommandError`].
//!
//! Sub-verbs (`list`, `all`, `add`, ...) are matched exactly and
//! case-sensitively by each handler; anything unrecognised falls back to help.

pub mod chatlog;
pub mod clan;
pub mod context;
pub mod donations;
pub mod error;
pub mod help;
pub mod notondiscord;
pub mod signup;
pub mod validate;
pub mod womsync;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::channels::ChatSurface;
use crate::messages::Embed;

pub use context::{CommandContext, Services};
pub use error::{CommandError, MissingArgument};
pub use validate::{require, validate, RequiredField, WebRequest};

/// One command as issued by a chat user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub guild_id: String,
    pub channel_id: String,
    pub author_id: String,
    /// Trimmed, comma-separated arguments; never empty.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        let mut args: Vec<String> = args.into_iter().map(|a| a.trim().to_string()).collect();
        if args.is_empty() {
            args.push(String::new());
        }
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            args,
        }
    }

    /// Argument at `index`, if the user supplied one.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// First token.
    pub fn verb(&self) -> &str {
        self.arg(0).unwrap_or("")
    }

    /// Second token, if any.
    pub fn sub_verb(&self) -> Option<&str> {
        self.arg(1)
    }

    /// True when the user asked for help or gave no arguments.
    pub fn wants_help(&self) -> bool {
        matches!(self.verb(), "" | "help")
    }
}

/// A chat message recognised as a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
}

/// Split a chat message into command name and arguments. Returns `None` when
/// the message does not start with `prefix` or names no command.
pub fn parse_command_line(prefix: &str, content: &str) -> Option<CommandLine> {
    let rest = content.strip_prefix(prefix)?.trim_start();
    let (name, tail) = match rest.split_once(char::is_whitespace) {
        Some((name, tail)) => (name, tail),
        None => (rest, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some(CommandLine {
        name: name.to_lowercase(),
        args: tail.split(',').map(|a| a.trim().to_string()).collect(),
    })
}

/// A chat command.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Argument synopsis shown in help listings.
    fn usage(&self) -> &'static str;

    /// Whether an empty or `help` first argument shows help instead of running.
    fn requires_args(&self) -> bool {
        true
    }

    /// Help content, rendered fresh for each request.
    fn help(&self, prefix: &str) -> Embed;

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError>;
}

/// Name → command table, built once at startup.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every command the bot ships with.
    pub fn with_builtin_commands() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(chatlog::ChatLogCommand));
        registry.register(Arc::new(clan::ClanCommand));
        registry.register(Arc::new(donations::DonationsCommand));
        registry.register(Arc::new(signup::SignupCommand));
        registry.register(Arc::new(womsync::WomSyncCommand));
        registry.register(Arc::new(notondiscord::NotOnDiscordCommand));
        registry.register(Arc::new(help::HelpCommand));
        registry
    }

    /// Add a command, replacing any previous command with the same name.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// All commands sorted by name.
    pub fn commands(&self) -> Vec<Arc<dyn Command>> {
        let mut all: Vec<_> = self.commands.values().cloned().collect();
        all.sort_by_key(|c| c.name());
        all
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// What the dispatcher did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Message did not start with the prefix.
    NotACommand,
    /// Prefix matched but no command has that name.
    UnknownCommand(String),
    /// The command's help was shown.
    Help(String),
    /// The handler ran to completion.
    Completed(String),
    /// The handler stopped with an error (already reported or logged).
    Failed(String, CommandError),
}

/// Routes parsed commands to their handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    services: Arc<Services>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, services: Arc<Services>) -> Self {
        Self { registry, services }
    }

    pub fn prefix(&self) -> &str {
        &self.services.prefix
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Parse and run a raw chat message.
    pub async fn handle_message(
        &self,
        surface: Arc<dyn ChatSurface>,
        guild_id: &str,
        channel_id: &str,
        author_id: &str,
        content: &str,
    ) -> DispatchOutcome {
        let Some(line) = parse_command_line(self.prefix(), content) else {
            return DispatchOutcome::NotACommand;
        };
        let invocation = Invocation::new(guild_id, channel_id, author_id, line.args);
        self.dispatch(surface, &line.name, invocation).await
    }

    /// Run `name` for an already-parsed invocation.
    pub async fn dispatch(
        &self,
        surface: Arc<dyn ChatSurface>,
        name: &str,
        invocation: Invocation,
    ) -> DispatchOutcome {
        let Some(command) = self.registry.get(name) else {
            debug!(target: "commands", name = %name, "unknown command");
            return DispatchOutcome::UnknownCommand(name.to_string());
        };

        let span = info_span!(
            "command",
            id = %Uuid::new_v4(),
            name = %command.name(),
            guild = %invocation.guild_id,
        );

        async move {
            let ctx = CommandContext {
                invocation,
                surface,
                services: self.services.clone(),
                registry: self.registry.clone(),
            };

            if command.requires_args() && ctx.invocation.wants_help() {
                ctx.reply_embed(command.help(ctx.prefix())).await;
                return DispatchOutcome::Help(command.name().to_string());
            }

            info!(target: "commands", args = ?ctx.invocation.args, "running command");
            match command.execute(&ctx).await {
                Ok(()) => DispatchOutcome::Completed(command.name().to_string()),
                Err(err) => {
                    ctx.report(&err).await;
                    DispatchOutcome::Failed(command.name().to_string(), err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Standard help embed: title, a one-line description, then one field per
/// usage example.
pub(crate) fn help_embed(title: &str, description: String, usages: &[(&str, String)]) -> Embed {
    Embed::new()
        .title(title)
        .description(description)
        .fields(usages.iter().map(|(name, value)| (*name, value.clone())))
        .timestamped()
}

/// Parse a non-negative whole number argument, or explain why not.
pub(crate) fn whole_number(label: &str, raw: &str) -> Result<u32, CommandError> {
    raw.parse::<u32>()
        .map_err(|_| CommandError::InvalidArgument {
            label: label.to_string(),
            reason: "must be a whole number".to_string(),
        })
}
