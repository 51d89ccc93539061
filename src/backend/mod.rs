//! Clan backend HTTP client
//!
//! Thin wrapper over `reqwest::Client` bound to the configured base URL,
//! bearer token and request timeout. Every call carries the per-invocation
//! identity headers from [`AuthContext`]. Failures are classified but never
//! retried or suppressed; the caller decides what the user sees.

pub mod wom;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthContext;
use crate::config::ApiConfig;

/// Backend call failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// No response was received (connect failure, timeout, TLS...).
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A success response whose body was not the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The client could not be constructed or a request could not be built.
    #[error("backend client error: {0}")]
    Client(String),
}

/// Client for the clan backend REST API.
#[derive(Debug, Clone)]
pub struct BackendGateway {
    client: reqwest::Client,
    base_url: String,
}

impl BackendGateway {
    /// Build the client with the bearer token installed as a default header.
    pub fn new(config: &ApiConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| BackendError::Client(format!("invalid API token: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Client(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Build the endpoint URL for a path.
    pub fn api_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, auth: &AuthContext) -> Result<Value, BackendError> {
        let request = self.request(Method::GET, path, auth)?;
        Self::execute(request).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: &AuthContext,
    ) -> Result<Value, BackendError> {
        let request = self.request(Method::POST, path, auth)?.json(body);
        Self::execute(request).await
    }

    /// DELETE with a JSON body.
    pub async fn delete<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: &AuthContext,
    ) -> Result<Value, BackendError> {
        let request = self.request(Method::DELETE, path, auth)?.json(body);
        Self::execute(request).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: &AuthContext,
    ) -> Result<T, BackendError> {
        decode(self.get(path, auth).await?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        auth: &AuthContext,
    ) -> Result<T, BackendError> {
        decode(self.post(path, body, auth).await?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        auth: &AuthContext,
    ) -> Result<RequestBuilder, BackendError> {
        let headers = auth
            .headers()
            .map_err(|e| BackendError::Client(format!("invalid identity header: {e}")))?;
        let url = self.api_url(path);
        debug!(target: "backend", method = %method, url = %url, "backend request");
        Ok(self.client.request(method, url).headers(headers))
    }

    async fn execute(request: RequestBuilder) -> Result<Value, BackendError> {
        let resp = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = resp.status();
        let body_text = resp
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        parse_response(status, body_text)
    }
}

/// Classify a response. Success bodies are parsed as JSON (an empty body is
/// `null`); failures carry the body's `message` field when it has one.
pub fn parse_response(status: StatusCode, body_text: String) -> Result<Value, BackendError> {
    if status.is_success() {
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body_text).map_err(|e| BackendError::Decode(e.to_string()));
    }

    let parsed: Value = serde_json::from_str(&body_text).unwrap_or(Value::Null);
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

    Err(BackendError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}
