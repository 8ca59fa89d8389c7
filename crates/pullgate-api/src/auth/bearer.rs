//! Registry-facing bearer tokens
//!
//! Follows the registry token-service contract: the response carries the
//! token, its lifetime in seconds and an RFC 3339 issuance time. The JWT
//! itself carries a docker-style `access` claim derived from the scope.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::ResourceScope;
use super::{check_secret, AuthError, PULL_TOKEN_USERNAME, TOKEN_LIFETIME_SECS};
use crate::config::BearerTokenConfig;

/// One entry of the `access` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAccess {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub actions: Vec<String>,
}

impl From<ResourceScope> for RegistryAccess {
    fn from(scope: ResourceScope) -> Self {
        Self {
            resource_type: scope.resource_type,
            name: scope.name,
            actions: scope.actions,
        }
    }
}

/// Claims of a registry bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub access: Vec<RegistryAccess>,
}

/// An issued bearer token
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_in: u64,
    pub issued_at: DateTime<Utc>,
}

/// Mints bearer tokens with a key that is never used for pull tokens
#[derive(Clone)]
pub struct BearerTokenIssuer {
    key: EncodingKey,
    issuer: String,
    audience: String,
}

impl BearerTokenIssuer {
    pub fn new(config: &BearerTokenConfig) -> Result<Self, AuthError> {
        check_secret("bearer token secret", &config.secret)?;
        Ok(Self {
            key: EncodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    pub fn issue(&self, scope: &str) -> Result<BearerToken, AuthError> {
        self.issue_at(scope, Utc::now())
    }

    pub fn issue_at(&self, scope: &str, now: DateTime<Utc>) -> Result<BearerToken, AuthError> {
        let access = ResourceScope::parse(scope).ok_or(AuthError::InvalidScope)?;

        let iat = now.timestamp();
        let claims = RegistryClaims {
            iss: self.issuer.clone(),
            sub: PULL_TOKEN_USERNAME.to_string(),
            aud: self.audience.clone(),
            iat,
            nbf: iat,
            exp: iat + TOKEN_LIFETIME_SECS,
            jti: Uuid::new_v4().to_string(),
            access: vec![access.into()],
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| {
            AuthError::Configuration(format!("failed to sign bearer token: {}", e))
        })?;

        Ok(BearerToken {
            token,
            expires_in: TOKEN_LIFETIME_SECS as u64,
            issued_at: DateTime::from_timestamp(iat, 0).unwrap_or(now),
        })
    }
}
