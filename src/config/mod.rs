//! Configuration parsing module
//!
//! Handles the JSON5 config file, `${VAR}` environment substitution, and the
//! legacy environment overrides (`PREFIX`, `API_URL`, `API_TOKEN`,
//! `DISCORD_TOKEN`). The result is an immutable [`BotConfig`] built once at
//! startup and shared read-only.

pub mod defaults;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use defaults::*;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse JSON5 at {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to read config file {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Missing environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid config at {path}: {message}")]
    InvalidShape { path: String, message: String },

    #[error("Validation error at {path}: {message}")]
    ValidationError { path: String, message: String },
}

/// Process-wide bot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Text a chat message must start with to be treated as a command
    pub prefix: String,
    pub api: ApiConfig,
    pub discord: DiscordConfig,
    pub wise_old_man: WiseOldManConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            api: ApiConfig::default(),
            discord: DiscordConfig::default(),
            wise_old_man: WiseOldManConfig::default(),
        }
    }
}

/// Clan backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Static bearer token sent on every backend call
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub api_base_url: String,
    pub gateway_url: String,
    pub intents: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: DEFAULT_DISCORD_API_BASE_URL.to_string(),
            gateway_url: DEFAULT_DISCORD_GATEWAY_URL.to_string(),
            intents: DEFAULT_DISCORD_INTENTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WiseOldManConfig {
    pub base_url: String,
}

impl Default for WiseOldManConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WISE_OLD_MAN_BASE_URL.to_string(),
        }
    }
}

impl BotConfig {
    /// Check the fields every mode depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.trim().is_empty() {
            return Err(validation("prefix", "must not be empty"));
        }
        check_http_url("api.baseUrl", &self.api.base_url)?;
        if self.api.timeout_secs == 0 {
            return Err(validation("api.timeoutSecs", "must be greater than zero"));
        }
        check_http_url("wiseOldMan.baseUrl", &self.wise_old_man.base_url)?;
        Ok(())
    }

    /// Extra checks for running against the Discord gateway.
    pub fn validate_for_gateway(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.discord.bot_token.trim().is_empty() {
            return Err(validation("discord.botToken", "must not be empty"));
        }
        check_http_url("discord.apiBaseUrl", &self.discord.api_base_url)?;
        Ok(())
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        mask(&mut copy.api.token);
        mask(&mut copy.discord.bot_token);
        copy
    }
}

fn mask(secret: &mut String) {
    if !secret.is_empty() {
        *secret = "[REDACTED]".to_string();
    }
}

fn validation(path: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        path: path.to_string(),
        message: message.to_string(),
    }
}

fn check_http_url(path: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::ValidationError {
        path: path.to_string(),
        message: format!("invalid URL {:?}: {}", raw, e),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError {
            path: path.to_string(),
            message: format!("unsupported scheme {:?}", other),
        }),
    }
}

/// Get the config file path.
/// Priority: CLANBOT_CONFIG_PATH > ~/.clanbot/clanbot.json5
/// Falls back to .json extension if the .json5 file doesn't exist.
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("CLANBOT_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let base = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clanbot");
    let json5 = base.join("clanbot.json5");
    if json5.exists() {
        return json5;
    }
    base.join("clanbot.json")
}

/// Load the config from the default path and apply process environment
/// overrides.
pub fn load_config() -> Result<BotConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    apply_env_overrides(&mut config, |name| env::var(name).ok());
    Ok(config)
}

/// Load config from a specific file without environment overrides.
/// Returns defaults if the file doesn't exist.
pub fn load_config_from(path: &Path) -> Result<BotConfig, ConfigError> {
    if !path.exists() {
        return Ok(BotConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut value = parse_json5(&content, path)?;
    substitute_env_vars(&mut value)?;

    serde_json::from_value(value).map_err(|e| ConfigError::InvalidShape {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Apply the environment variables the bot has always honoured. Non-empty
/// values win over the file.
pub fn apply_env_overrides<F>(config: &mut BotConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(prefix) = get("PREFIX") {
        config.prefix = prefix;
    }
    if let Some(url) = get("API_URL") {
        config.api.base_url = url;
    }
    if let Some(token) = get("API_TOKEN") {
        config.api.token = token;
    }
    if let Some(token) = get("DISCORD_TOKEN") {
        config.discord.bot_token = token;
    }
}

/// Parse JSON5 content
fn parse_json5(content: &str, path: &Path) -> Result<Value, ConfigError> {
    json5::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Substitute environment variables in string values.
/// Pattern: ${VAR} where VAR matches [A-Z_][A-Z0-9_]*
/// Escape with $${VAR} to get literal ${VAR}
fn substitute_env_vars(value: &mut Value) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => {
            *s = substitute_env_in_string(s)?;
        }
        Value::Object(obj) => {
            for (_, v) in obj.iter_mut() {
                substitute_env_vars(v)?;
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_env_vars(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$?\{([A-Z_][A-Z0-9_]*)\}").expect("failed to compile regex: env_var")
});

fn substitute_env_in_string(s: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(s.len());
    let mut last_end = 0;

    for caps in ENV_VAR_PATTERN.captures_iter(s) {
        let (Some(full_match), Some(var)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let var_name = var.as_str();

        result.push_str(&s[last_end..full_match.start()]);

        if full_match.as_str().starts_with("$$") {
            result.push_str(&format!("${{{}}}", var_name));
        } else {
            let value = env::var(var_name).map_err(|_| ConfigError::MissingEnvVar {
                var: var_name.to_string(),
            })?;
            result.push_str(&value);
        }

        last_end = full_match.end();
    }

    result.push_str(&s[last_end..]);

    Ok(result)
}
