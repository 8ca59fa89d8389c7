//! Token exchange primitives
//!
//! Two trust domains meet here. A *pull token* is an internal capability,
//! minted for one workspace/application pair and handed to clients as a
//! registry password. A *bearer token* is what the registry itself accepts.
//! The two are signed with different secrets and never share key material.

pub mod basic;
pub mod bearer;
pub mod pull_token;
pub mod scope;

use thiserror::Error;
use tracing::{error, warn};

use crate::error::ApiError;

pub use basic::{parse_basic_auth, parse_pull_credentials, BasicCredentials};
pub use bearer::{BearerToken, BearerTokenIssuer, RegistryAccess, RegistryClaims};
pub use pull_token::{PullToken, PullTokenClaims, PullTokenIssuer, PullTokenValidator};
pub use scope::{pull_scope, scopes_match, ResourceScope};

/// Username clients must present alongside a pull token
pub const PULL_TOKEN_USERNAME: &str = "pull-token";

/// Minimum accepted length, in bytes, of any signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Lifetime of both pull tokens and registry bearer tokens, in seconds
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Errors raised by the token primitives
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed authorization header: {0}")]
    MalformedAuthHeader(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid {0}")]
    InvalidSlug(&'static str),

    #[error("invalid scope")]
    InvalidScope,

    #[error("{0}")]
    Configuration(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedAuthHeader(reason) => {
                warn!(reason, "Rejected malformed Authorization header");
                ApiError::Unauthorized("malformed authorization header".to_string())
            }
            AuthError::InvalidCredentials => {
                warn!("Rejected credentials with unexpected username");
                ApiError::Unauthorized("invalid credentials".to_string())
            }
            AuthError::InvalidToken(reason) => {
                warn!(reason = %reason, "Pull token rejected");
                ApiError::Unauthorized("invalid or expired token".to_string())
            }
            AuthError::InvalidSlug(what) => ApiError::BadRequest(format!("invalid {}", what)),
            AuthError::InvalidScope => ApiError::BadRequest("invalid scope".to_string()),
            AuthError::Configuration(msg) => {
                error!(error = %msg, "Token signing misconfigured");
                ApiError::Configuration(msg)
            }
        }
    }
}

/// Reject an unset or too-short signing secret. Never logs the value.
pub fn check_secret(name: &str, secret: &str) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Configuration(format!("{} is not configured", name)));
    }
    if secret.len() < MIN_SECRET_LEN {
        return Err(AuthError::Configuration(format!(
            "{} must be at least {} bytes",
            name, MIN_SECRET_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_secret() {
        assert!(check_secret("s", &"x".repeat(MIN_SECRET_LEN)).is_ok());
        assert!(matches!(
            check_secret("s", ""),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            check_secret("s", &"x".repeat(MIN_SECRET_LEN - 1)),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        let api: ApiError = AuthError::InvalidCredentials.into();
        assert!(matches!(api, ApiError::Unauthorized(_)));

        let api: ApiError = AuthError::InvalidToken("ExpiredSignature".into()).into();
        // detail stays in the log, not in the response
        assert_eq!(api.to_string(), "invalid or expired token");

        let api: ApiError = AuthError::InvalidSlug("workspace slug").into();
        assert!(matches!(api, ApiError::BadRequest(_)));

        let api: ApiError = AuthError::Configuration("x".into()).into();
        assert!(matches!(api, ApiError::Configuration(_)));
    }
}
