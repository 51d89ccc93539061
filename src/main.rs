use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use clanbot::channels::discord::DiscordChannel;
use clanbot::channels::discord_gateway::{discord_gateway_loop, GatewaySettings};
use clanbot::channels::ChatSurface;
use clanbot::cli::{self, Cli, Command, ConfigCommand, ConsoleIdentity};
use clanbot::commands::{CommandRegistry, Dispatcher, Services};
use clanbot::config::{self, BotConfig};
use clanbot::logging::{self, LogConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        // No subcommand or explicit `start` both connect to Discord.
        None | Some(Command::Start) => {
            init_logging(cli.log_format)?;
            run_bot().await
        }

        Some(Command::Console {
            guild,
            author,
            channel,
        }) => {
            init_logging(cli.log_format)?;
            let cfg = load_and_validate_config(false)?;
            let dispatcher = build_dispatcher(&cfg)?;
            cli::run_console(
                dispatcher,
                ConsoleIdentity {
                    guild,
                    author,
                    channel,
                },
            )
            .await
        }

        Some(Command::Config(sub)) => {
            match sub {
                ConfigCommand::Show => cli::handle_config_show()?,
                ConfigCommand::Path => cli::handle_config_path(),
            }
            Ok(())
        }

        Some(Command::RosterDiff { group, names }) => {
            cli::handle_roster_diff(&group, &names).await
        }

        Some(Command::Version) => {
            cli::handle_version();
            Ok(())
        }
    }
}

/// Logs go to stderr so console replies on stdout stay readable.
fn init_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let log_config = LogConfig::default()
        .with_format(format)
        .with_output(logging::LogOutput::Stderr);
    logging::init_logging(log_config)?;
    Ok(())
}

fn load_and_validate_config(gateway: bool) -> Result<BotConfig, Box<dyn std::error::Error>> {
    let path = config::get_config_path();
    let cfg = config::load_config()?;
    let checked = if gateway {
        cfg.validate_for_gateway()
    } else {
        cfg.validate()
    };
    if let Err(e) = checked {
        error!(target: "config", path = %path.display(), error = %e, "invalid configuration");
        return Err(e.into());
    }
    info!(
        target: "config",
        path = %path.display(),
        api = %cfg.api.base_url,
        prefix = %cfg.prefix,
        "configuration loaded"
    );
    Ok(cfg)
}

fn build_dispatcher(cfg: &BotConfig) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let services = Services::from_config(cfg)?;
    let registry = CommandRegistry::with_builtin_commands();
    info!(target: "commands", count = registry.len(), "commands registered");
    Ok(Dispatcher::new(Arc::new(registry), Arc::new(services)))
}

async fn run_bot() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = load_and_validate_config(true)?;
    let dispatcher = build_dispatcher(&cfg)?;
    let surface: Arc<dyn ChatSurface> = Arc::new(DiscordChannel::new(
        cfg.discord.api_base_url.clone(),
        cfg.discord.bot_token.clone(),
    ));
    let settings = GatewaySettings {
        gateway_url: cfg.discord.gateway_url.clone(),
        bot_token: cfg.discord.bot_token.clone(),
        intents: cfg.discord.intents,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let gateway = tokio::spawn(discord_gateway_loop(
        settings,
        dispatcher,
        surface,
        shutdown_rx,
    ));

    tokio::signal::ctrl_c().await?;
    info!(target: "gateway", "shutdown requested");
    let _ = shutdown_tx.send(true);
    if let Err(e) = gateway.await {
        error!(target: "gateway", error = %e, "gateway task failed");
    }

    info!(target: "gateway", "clanbot shut down");
    Ok(())
}
