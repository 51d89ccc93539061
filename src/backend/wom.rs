//! Wise Old Man group roster client.

use serde::Deserialize;
use tracing::debug;

use super::{parse_response, BackendError};
use crate::config::WiseOldManConfig;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One entry of a group's member list. Only the username is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupMember {
    pub username: String,
}

/// Read-only client for the public Wise Old Man API.
#[derive(Debug, Clone)]
pub struct WiseOldManClient {
    client: reqwest::Client,
    base_url: String,
}

impl WiseOldManClient {
    pub fn new(config: &WiseOldManConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Client(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn members_url(&self, group_id: &str) -> String {
        format!(
            "{}/groups/{}/members",
            self.base_url.trim_end_matches('/'),
            group_id
        )
    }

    /// Usernames of everyone in the group, in the order the API returns them.
    pub async fn group_member_names(&self, group_id: &str) -> Result<Vec<String>, BackendError> {
        let url = self.members_url(group_id);
        debug!(target: "backend", url = %url, "fetching wise old man group");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = resp.status();
        let body_text = resp
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let value = parse_response(status, body_text)?;

        let members: Vec<GroupMember> =
            serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(members.into_iter().map(|m| m.username).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_url() {
        let client = WiseOldManClient::new(&WiseOldManConfig {
            base_url: "https://api.wiseoldman.net/".to_string(),
        })
        .unwrap();
        assert_eq!(
            client.members_url("139"),
            "https://api.wiseoldman.net/groups/139/members"
        );
    }

    #[test]
    fn test_group_member_ignores_extra_fields() {
        let members: Vec<GroupMember> = serde_json::from_str(
            r#"[{"id":1,"username":"zezima","displayName":"Zezima"},{"username":"woox"}]"#,
        )
        .unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].username, "zezima");
    }

    #[tokio::test]
    async fn test_truncated_body_is_transport() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n[")
                    .await;
                let _ = sock.shutdown().await;
            }
        });

        let client = WiseOldManClient::new(&WiseOldManConfig {
            base_url: format!("http://{addr}"),
        })
        .unwrap();
        let result = client.group_member_names("139").await;
        assert!(
            matches!(result, Err(BackendError::Transport(_))),
            "got {result:?}"
        );
    }
}
