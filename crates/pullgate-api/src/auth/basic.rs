//! HTTP Basic credential parsing

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};

use super::{AuthError, PULL_TOKEN_USERNAME};

const BASIC_PREFIX: &str = "Basic ";

/// Decoded Basic-auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Render as an `Authorization` header value
    pub fn to_header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("{}{}", BASIC_PREFIX, STANDARD.encode(raw))
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parse an `Authorization: Basic ...` header value.
///
/// The decoded payload is split on the first colon only, so the password
/// may itself contain colons.
pub fn parse_basic_auth(header_value: &str) -> Result<BasicCredentials, AuthError> {
    let encoded = header_value
        .strip_prefix(BASIC_PREFIX)
        .ok_or(AuthError::MalformedAuthHeader("expected Basic scheme"))?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedAuthHeader("invalid base64"))?;

    let decoded =
        String::from_utf8(decoded).map_err(|_| AuthError::MalformedAuthHeader("invalid utf-8"))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedAuthHeader("missing ':' separator"))?;

    Ok(BasicCredentials::new(username, password))
}

/// Parse Basic credentials and require the pull-token username.
///
/// The username is checked before the password is looked at; the password
/// is a capability token, not something a human typed.
pub fn parse_pull_credentials(header_value: &str) -> Result<BasicCredentials, AuthError> {
    let credentials = parse_basic_auth(header_value)?;
    if credentials.username != PULL_TOKEN_USERNAME {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(credentials)
}
