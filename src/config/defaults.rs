//! Built-in configuration defaults.
//!
//! These values apply when the config file omits a field or does not exist.

/// Command prefix recognised in chat messages.
pub const DEFAULT_PREFIX: &str = "??";

/// Backend request timeout.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 100;

pub const DEFAULT_DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";

pub const DEFAULT_DISCORD_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

pub const DEFAULT_WISE_OLD_MAN_BASE_URL: &str = "https://api.wiseoldman.net";

/// Gateway intents: GUILDS | GUILD_MEMBERS | GUILD_MESSAGES | MESSAGE_CONTENT.
pub const DEFAULT_DISCORD_INTENTS: u64 = (1 << 0) | (1 << 1) | (1 << 9) | (1 << 15);
