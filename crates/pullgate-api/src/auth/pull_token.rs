//! Pull capability tokens
//!
//! HS256 JWTs carrying exactly `{scope, iat, exp}`. They are minted for a
//! single workspace/application pair and are valid for one hour.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::scope::pull_scope;
use super::{check_secret, AuthError, TOKEN_LIFETIME_SECS};

/// Claims of a pull token. Unknown fields are rejected on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PullTokenClaims {
    /// `repository:<workspace>/<app>:pull`
    pub scope: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds), always `iat + 3600`
    pub exp: i64,
}

impl PullTokenClaims {
    fn new(scope: String, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            scope,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// True once `now` has reached the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// A freshly minted token and the claims it encodes
#[derive(Debug, Clone)]
pub struct PullToken {
    pub token: String,
    pub claims: PullTokenClaims,
}

/// Mints pull tokens
#[derive(Clone)]
pub struct PullTokenIssuer {
    key: EncodingKey,
}

impl PullTokenIssuer {
    /// Fails if the secret is unset or shorter than the minimum length
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        check_secret("pull token secret", secret)?;
        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Mint a token for `workspace_slug/app_slug`.
    ///
    /// The caller must already have checked that the application exists.
    pub fn mint(&self, workspace_slug: &str, app_slug: &str) -> Result<String, AuthError> {
        Ok(self.issue(workspace_slug, app_slug)?.token)
    }

    pub fn issue(&self, workspace_slug: &str, app_slug: &str) -> Result<PullToken, AuthError> {
        self.issue_at(workspace_slug, app_slug, Utc::now())
    }

    pub fn issue_at(
        &self,
        workspace_slug: &str,
        app_slug: &str,
        now: DateTime<Utc>,
    ) -> Result<PullToken, AuthError> {
        validate_slug("workspace slug", workspace_slug)?;
        validate_slug("app slug", app_slug)?;

        let claims = PullTokenClaims::new(pull_scope(workspace_slug, app_slug), now);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Configuration(format!("failed to sign pull token: {}", e)))?;

        Ok(PullToken { token, claims })
    }
}

/// Slugs become part of the scope string, so they may not contain the
/// scope separators. Otherwise `a/b` + `c` and `a` + `b/c` would mint the
/// same scope.
fn validate_slug(what: &'static str, slug: &str) -> Result<(), AuthError> {
    if slug.is_empty() || slug.chars().any(|c| c == '/' || c == ':' || c.is_whitespace()) {
        return Err(AuthError::InvalidSlug(what));
    }
    Ok(())
}

/// Verifies pull tokens against the current secret only
#[derive(Clone)]
pub struct PullTokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl PullTokenValidator {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        check_secret("pull token secret", secret)?;

        // Expiry is checked by hand so that `now == exp` is already expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn validate(&self, token: &str) -> Result<PullTokenClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PullTokenClaims, AuthError> {
        let claims = decode::<PullTokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.exp - claims.iat != TOKEN_LIFETIME_SECS {
            return Err(AuthError::InvalidToken("unexpected lifetime".to_string()));
        }

        if claims.is_expired_at(now) {
            return Err(AuthError::InvalidToken("expired".to_string()));
        }

        Ok(claims)
    }
}
