//! Outbound message payloads
//!
//! A reply is either plain text or a single rich embed. The embed model
//! follows Discord's shape closely enough to serialize straight into a
//! `POST channels/{id}/messages` body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Accent colour used on every embed the bot sends (`#1a6ba1`).
pub const EMBED_COLOR: u32 = 0x1a6ba1;

/// Placeholder Discord accepts where a field value would otherwise be empty.
pub const BLANK_FIELD: &str = "\u{200b}";

/// Type of message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text message
    Text { text: String },
    /// Rich embed message
    Embed { embed: Embed },
}

impl MessageContent {
    /// Create a text message content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an embed message content
    pub fn embed(embed: Embed) -> Self {
        Self::Embed { embed }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Embed { .. } => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Self::Embed { embed } => Some(embed),
            Self::Text { .. } => None,
        }
    }

    /// JSON body for Discord's create-message endpoint.
    pub fn to_discord_body(&self) -> Value {
        match self {
            Self::Text { text } => json!({ "content": text }),
            Self::Embed { embed } => json!({ "embeds": [embed] }),
        }
    }

    /// Render for a plain terminal.
    pub fn render_plain(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Embed { embed } => embed.render_plain(),
        }
    }
}

impl From<Embed> for MessageContent {
    fn from(embed: Embed) -> Self {
        Self::embed(embed)
    }
}

/// A single name/value row inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich message body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// RFC 3339 timestamp shown in the embed footer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    /// Start an embed in the bot's accent colour.
    pub fn new() -> Self {
        Self {
            color: Some(EMBED_COLOR),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field. Blank names or values are replaced with a zero-width
    /// space since Discord rejects empty field text.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: non_blank(name.into()),
            value: non_blank(value.into()),
            inline: false,
        });
        self
    }

    pub fn fields<I, N, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        fields
            .into_iter()
            .fold(self, |embed, (name, value)| embed.field(name, value))
    }

    /// Stamp the embed with the current time.
    pub fn timestamped(mut self) -> Self {
        self.timestamp = Some(chrono::Utc::now().to_rfc3339());
        self
    }

    pub fn render_plain(&self) -> String {
        let mut lines = Vec::new();
        if let Some(title) = &self.title {
            lines.push(format!("== {} ==", title));
        }
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        for field in &self.fields {
            if field.name == BLANK_FIELD && field.value == BLANK_FIELD {
                continue;
            }
            lines.push(format!("{}: {}", field.name, field.value));
        }
        lines.join("\n")
    }
}

fn non_blank(text: String) -> String {
    if text.trim().is_empty() {
        BLANK_FIELD.to_string()
    } else {
        text
    }
}

/// Render a JSON scalar for display: strings as-is, everything else via its
/// JSON text. Missing values render as an empty string.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
