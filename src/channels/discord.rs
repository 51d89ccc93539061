//! Discord REST channel.
//!
//! Sends replies with `POST channels/{id}/messages` and lists guild members
//! with the paged `GET guilds/{id}/members` endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::channels::{ChannelError, ChatSurface};
use crate::messages::MessageContent;
use crate::roster::RosterMember;

/// Largest page the member-list endpoint returns.
const MEMBER_PAGE_SIZE: usize = 1000;

/// Stop paging after this many members.
const MAX_MEMBERS: usize = 250_000;

#[derive(Debug, Deserialize)]
struct GuildMember {
    #[serde(default)]
    nick: Option<String>,
    user: Option<MemberUser>,
}

#[derive(Debug, Deserialize)]
struct MemberUser {
    id: String,
    username: String,
    #[serde(default)]
    bot: bool,
}

/// A chat surface backed by the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordChannel {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl DiscordChannel {
    /// Create a new Discord channel targeting the given API base URL.
    pub fn new(base_url: String, bot_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            bot_token,
        }
    }

    /// Build the API endpoint URL for a path.
    fn api_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}", base, path)
    }

    fn authorization(&self) -> Result<HeaderValue, ChannelError> {
        let mut value = HeaderValue::from_str(&format_bot_token(&self.bot_token))
            .map_err(|e| ChannelError::Transport(format!("invalid bot token: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn parse_response(resp: reqwest::Response) -> Result<Value, ChannelError> {
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();
        let parsed: Value = serde_json::from_str(&body_text).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(parsed);
        }

        let message = parsed
            .get("message")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| {
                if body_text.is_empty() {
                    None
                } else {
                    Some(body_text.clone())
                }
            })
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(ChannelError::Rejected {
            platform: "discord",
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_member_page(
        &self,
        guild_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<GuildMember>, ChannelError> {
        let mut request = self
            .client
            .get(self.api_url(&format!("guilds/{}/members", guild_id)))
            .header(AUTHORIZATION, self.authorization()?)
            .query(&[("limit", MEMBER_PAGE_SIZE.to_string())]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        let value = Self::parse_response(resp).await?;
        serde_json::from_value(value).map_err(|e| ChannelError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatSurface for DiscordChannel {
    async fn send(&self, channel_id: &str, content: MessageContent) -> Result<(), ChannelError> {
        if content.as_text().is_some_and(str::is_empty) {
            return Err(ChannelError::Decode("text must not be empty".to_string()));
        }

        let resp = self
            .client
            .post(self.api_url(&format!("channels/{}/messages", channel_id)))
            .header(AUTHORIZATION, self.authorization()?)
            .json(&content.to_discord_body())
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Self::parse_response(resp).await.map(|_| ())
    }

    async fn list_members(&self, guild_id: &str) -> Result<Vec<RosterMember>, ChannelError> {
        let mut members = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page = self.fetch_member_page(guild_id, after.as_deref()).await?;
            let page_len = page.len();
            for member in page {
                if let Some(roster_member) = to_roster_member(member) {
                    after = Some(roster_member.id.clone());
                    members.push(roster_member);
                }
            }
            if page_len < MEMBER_PAGE_SIZE || members.len() >= MAX_MEMBERS {
                break;
            }
        }

        debug!(guild = %guild_id, count = members.len(), "fetched discord members");
        Ok(members)
    }
}

fn to_roster_member(member: GuildMember) -> Option<RosterMember> {
    let user = member.user?;
    Some(RosterMember {
        id: user.id,
        account_name: user.username,
        nickname: member.nick,
        bot: user.bot,
    })
}

pub(crate) fn format_bot_token(token: &str) -> String {
    if token.trim_start().starts_with("Bot ") {
        token.to_string()
    } else {
        format!("Bot {}", token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_channel() -> DiscordChannel {
        DiscordChannel::new("http://localhost:8080/".to_string(), "token".to_string())
    }

    #[test]
    fn test_discord_api_url() {
        let ch = test_channel();
        assert_eq!(
            ch.api_url("channels/123/messages"),
            "http://localhost:8080/channels/123/messages"
        );
    }

    #[test]
    fn test_format_bot_token() {
        assert_eq!(format_bot_token("abc"), "Bot abc");
        assert_eq!(format_bot_token("Bot abc"), "Bot abc");
    }

    #[test]
    fn test_member_mapping() {
        let raw = r#"[
            {"nick": "Zezima", "user": {"id": "1", "username": "zez_acct"}},
            {"nick": null, "user": {"id": "2", "username": "Woox", "global_name": "W"}},
            {"user": {"id": "3", "username": "Clanbot", "bot": true}},
            {"nick": "ghost"}
        ]"#;
        let page: Vec<GuildMember> = serde_json::from_str(raw).unwrap();
        let members: Vec<RosterMember> = page.into_iter().filter_map(to_roster_member).collect();

        assert_eq!(members.len(), 3);
        assert_eq!(members[0].display_name(), "Zezima");
        assert_eq!(members[1].display_name(), "Woox");
        assert!(members[2].bot);
    }

    #[tokio::test]
    async fn test_discord_send_connection_failure() {
        let ch = DiscordChannel::new("http://192.0.2.1:1".to_string(), "token".to_string());
        let client_timeout = std::time::Duration::from_secs(10);
        let result = tokio::time::timeout(
            client_timeout,
            ch.send("123", MessageContent::text("Hello Discord")),
        )
        .await;
        if let Ok(result) = result {
            assert!(matches!(result, Err(ChannelError::Transport(_))));
        }
    }

    #[tokio::test]
    async fn test_discord_send_empty_text_rejected() {
        let ch = test_channel();
        let result = ch.send("123", MessageContent::text("")).await;
        assert!(matches!(result, Err(ChannelError::Decode(_))));
    }
}
