//! Caller identity forwarded to the backend.
//!
//! The backend authorizes requests from the bearer token plus two asserted
//! identity headers: the Discord user who issued the command and the guild it
//! was issued in. Nothing here is a credential; the values are taken from the
//! inbound event as-is and rebuilt for every invocation.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

use crate::commands::Invocation;

/// Header carrying the Discord id of the user who issued the command.
pub const USER_ID_HEADER: &str = "userdiscordid";

/// Header carrying the Discord id of the guild the command was issued in.
pub const SERVER_ID_HEADER: &str = "discordserverid";

/// Identity asserted on behalf of a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub caller_id: String,
    pub community_id: String,
}

impl AuthContext {
    pub fn new(caller_id: impl Into<String>, community_id: impl Into<String>) -> Self {
        Self {
            caller_id: caller_id.into(),
            community_id: community_id.into(),
        }
    }

    /// Derive the identity for an invocation.
    pub fn resolve(invocation: &Invocation) -> Self {
        Self::new(&invocation.author_id, &invocation.guild_id)
    }

    /// Render as request headers.
    ///
    /// Fails only if an id contains bytes that are not valid in a header.
    pub fn headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&self.caller_id)?,
        );
        headers.insert(
            HeaderName::from_static(SERVER_ID_HEADER),
            HeaderValue::from_str(&self.community_id)?,
        );
        Ok(headers)
    }
}
