//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `start` (default) -- connect to Discord and serve commands
//! - `console` -- run commands typed on stdin against the real backend
//! - `config show|path` -- inspect configuration
//! - `roster-diff` -- offline roster comparison against a Wise Old Man group
//! - `version` -- print version info

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::backend::wom::WiseOldManClient;
use crate::channels::console::ConsoleChannel;
use crate::channels::ChatSurface;
use crate::commands::{DispatchOutcome, Dispatcher};
use crate::config;
use crate::logging::LogFormat;
use crate::roster::diff_rosters;

/// Discord bot for clan chat logs, donations, and roster upkeep.
#[derive(Parser, Debug)]
#[command(
    name = "clanbot",
    version = env!("CARGO_PKG_VERSION"),
    about = "Discord bot for clan chat logs, donations, and roster upkeep"
)]
pub struct Cli {
    /// Log output format.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Plaintext)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the Discord gateway (default when no subcommand is given).
    Start,

    /// Read commands from stdin and print replies.
    Console {
        /// Server id sent to the backend.
        #[arg(long, default_value = "console")]
        guild: String,

        /// Caller id sent to the backend.
        #[arg(long, default_value = "console")]
        author: String,

        /// Channel name shown next to replies.
        #[arg(long, default_value = "console")]
        channel: String,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List Wise Old Man group members missing from a roster file.
    RosterDiff {
        /// Wise Old Man group id.
        #[arg(long)]
        group: String,

        /// File with one chat roster name per line.
        #[arg(long)]
        names: PathBuf,
    },

    /// Print version information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets masked.
    Show,
    /// Print the config file path.
    Path,
}

/// Run the `config show` subcommand.
pub fn handle_config_show() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    println!("{}", serde_json::to_string_pretty(&cfg.redacted())?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("clanbot {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Platform: {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

/// Chat roster names from a file: one per line, blanks and `#` comments
/// skipped.
pub fn read_roster_file(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_roster_lines(&text))
}

fn parse_roster_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Run the `roster-diff` subcommand.
pub async fn handle_roster_diff(
    group: &str,
    names: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    let chat_roster = read_roster_file(names)?;
    let wom = WiseOldManClient::new(&cfg.wise_old_man)?;
    let external = wom.group_member_names(group).await?;

    let missing = diff_rosters(&chat_roster, &external);
    if missing.is_empty() {
        println!("{}", crate::commands::notondiscord::EVERYONE_PRESENT);
    }
    for name in missing {
        println!("{name}");
    }
    Ok(())
}

/// Identity used for every console command.
#[derive(Debug, Clone)]
pub struct ConsoleIdentity {
    pub guild: String,
    pub author: String,
    pub channel: String,
}

/// Dispatch each stdin line until EOF. Lines that are not commands get a
/// short hint.
pub async fn run_console(
    dispatcher: Dispatcher,
    identity: ConsoleIdentity,
) -> Result<(), Box<dyn std::error::Error>> {
    let surface: Arc<dyn ChatSurface> = Arc::new(ConsoleChannel::new());
    let prefix = dispatcher.prefix().to_string();
    info!(target: "commands", guild = %identity.guild, "console ready");
    eprintln!("Type commands starting with {prefix} (ctrl-d to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let outcome = dispatcher
            .handle_message(
                surface.clone(),
                &identity.guild,
                &identity.channel,
                &identity.author,
                line,
            )
            .await;
        match outcome {
            DispatchOutcome::NotACommand => eprintln!("Commands start with {prefix}"),
            DispatchOutcome::UnknownCommand(name) => {
                eprintln!("Unknown command {name:?}; try {prefix}help")
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args_defaults_to_none() {
        let cli = Cli::try_parse_from(["clanbot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, LogFormat::Plaintext);
    }

    #[test]
    fn test_cli_start_with_json_logs() {
        let cli = Cli::try_parse_from(["clanbot", "start", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Start)));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_cli_console_identity() {
        let cli =
            Cli::try_parse_from(["clanbot", "console", "--guild", "g1", "--author", "u1"]).unwrap();
        match cli.command {
            Some(Command::Console {
                guild,
                author,
                channel,
            }) => {
                assert_eq!(guild, "g1");
                assert_eq!(author, "u1");
                assert_eq!(channel, "console");
            }
            other => panic!("Expected Console, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_config_subcommands() {
        let cli = Cli::try_parse_from(["clanbot", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config(ConfigCommand::Show))));
        let cli = Cli::try_parse_from(["clanbot", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config(ConfigCommand::Path))));
    }

    #[test]
    fn test_cli_roster_diff_requires_group() {
        assert!(Cli::try_parse_from(["clanbot", "roster-diff", "--names", "x.txt"]).is_err());
        let cli = Cli::try_parse_from([
            "clanbot",
            "roster-diff",
            "--group",
            "139",
            "--names",
            "x.txt",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::RosterDiff { .. })));
    }

    #[test]
    fn test_cli_unknown_subcommand() {
        assert!(Cli::try_parse_from(["clanbot", "serve"]).is_err());
    }

    #[test]
    fn test_parse_roster_lines() {
        let names = parse_roster_lines("Zezima\n\n  # officers\nWoox  \n");
        assert_eq!(names, vec!["Zezima", "Woox"]);
    }

    #[test]
    fn test_read_roster_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.txt");
        std::fs::write(&path, "Zezima\nB0aty\n").unwrap();
        assert_eq!(read_roster_file(&path).unwrap(), vec!["Zezima", "B0aty"]);
        assert!(read_roster_file(&dir.path().join("missing.txt")).is_err());
    }
}
