//! Logging subsystem
//!
//! Structured logging via tracing, as JSON (production) or plaintext
//! (development). All output passes through [`redact::RedactingMakeWriter`].
//!
//! # Log Targets
//!
//! - `gateway` - Discord gateway connection and event loop
//! - `commands` - command dispatch and handler outcomes
//! - `backend` - clan backend and Wise Old Man requests
//! - `config` - configuration loading
//!
//! # Environment Variables
//!
//! - `CLANBOT_LOG` - Primary log level/filter (takes precedence)
//! - `RUST_LOG` - Fallback log level/filter
//!
//! # Examples
//!
//! ```no_run
//! use clanbot::logging::{init_logging, LogConfig};
//!
//! init_logging(LogConfig::production()).unwrap();
//! ```

pub mod redact;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::logging::redact::RedactingMakeWriter;

static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// JSON lines, one event per line
    Json,
    /// Human-readable plaintext
    #[default]
    Plaintext,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File(PathBuf),
}

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Level used when neither `CLANBOT_LOG` nor `RUST_LOG` is set
    pub default_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// Plaintext to stdout at debug level.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            ..Self::default()
        }
    }

    /// JSON to stdout at info level.
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log file: {0}")]
    FileCreation(#[from] io::Error),
    #[error("failed to parse log filter: {0}")]
    FilterParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to initialize subscriber: {0}")]
    TryInit(#[from] tracing_subscriber::util::TryInitError),
}

/// CLANBOT_LOG, then RUST_LOG, then `default_level` for the bot's targets.
fn build_env_filter(default_level: Level) -> Result<EnvFilter, LoggingError> {
    build_env_filter_from(default_level, |name| std::env::var(name).ok())
}

fn build_env_filter_from(
    default_level: Level,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EnvFilter, LoggingError> {
    if let Some(filter) = lookup("CLANBOT_LOG").or_else(|| lookup("RUST_LOG")) {
        return Ok(EnvFilter::try_new(filter)?);
    }
    Ok(EnvFilter::try_new(default_directives(default_level))?)
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directives = vec![level.clone()];
    directives.extend(targets::ALL.iter().map(|t| format!("{t}={level}")));
    directives.join(",")
}

fn make_writer(output: &LogOutput) -> Result<BoxMakeWriter, LoggingError> {
    Ok(match output {
        LogOutput::Stdout => BoxMakeWriter::new(io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
        LogOutput::File(path) => BoxMakeWriter::new(Mutex::new(File::create(path)?)),
    })
}

/// Install the global subscriber. Call once at startup; later calls fail
/// with [`LoggingError::AlreadyInitialized`].
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    if INIT_GUARD.set(()).is_err() {
        return Err(LoggingError::AlreadyInitialized);
    }
    install(config)
}

/// Plaintext debug logging for tests; repeated calls are ignored.
pub fn init_test_logging() {
    let _ = install(LogConfig::development());
}

fn install(config: LogConfig) -> Result<(), LoggingError> {
    let filter = build_env_filter(config.default_level)?;
    let writer = RedactingMakeWriter::new(make_writer(&config.output)?);
    let timer = UtcTime::rfc_3339();

    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_timer(timer)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Plaintext => tracing_subscriber::fmt::layer()
            .with_timer(timer)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}

/// Log target constants
pub mod targets {
    pub const GATEWAY: &str = "gateway";
    pub const COMMANDS: &str = "commands";
    pub const BACKEND: &str = "backend";
    pub const CONFIG: &str = "config";

    pub const ALL: &[&str] = &[GATEWAY, COMMANDS, BACKEND, CONFIG];
}
