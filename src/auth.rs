use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::request::Credentials;

/// Per-database credentials policy. The core treats it as a capability
/// check: a request either carries credentials matching one of the
/// configured entries or it is rejected with 401.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub by_credentials: Vec<CredentialEntry>,
}

/// Where credentials are expected to arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    /// `Authorization: Basic` header
    #[default]
    HttpBasic,
    /// `credentials` carrier inside the request body
    Inline,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    pub user: String,
    pub password: String,
}

impl AuthConfig {
    /// Check provided credentials against the configured entries. The
    /// preferred source follows `mode`; the other carrier is accepted as a
    /// fallback so Basic-auth clients can talk to inline-mode databases.
    #[must_use]
    pub fn authorize(
        &self,
        inline: Option<&Credentials>,
        basic: Option<&(String, String)>,
    ) -> bool {
        let inline = inline.map(|c| (c.user.as_str(), c.password.as_str()));
        let basic = basic.map(|(u, p)| (u.as_str(), p.as_str()));
        let provided = match self.mode {
            AuthMode::Inline => inline.or(basic),
            AuthMode::HttpBasic => basic.or(inline),
        };
        match provided {
            Some((user, password)) => self
                .by_credentials
                .iter()
                .any(|entry| entry.user == user && entry.password == password),
            None => false,
        }
    }
}

/// Decode an `Authorization: Basic <payload>` header value.
#[must_use]
pub fn parse_basic_header(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, password) = text.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}
