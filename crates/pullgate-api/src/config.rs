//! API configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::error;

use crate::auth::check_secret;
use crate::error::ApiError;

/// API server configuration
///
/// Every secret here is read once at startup and never mutated afterwards.
/// Changing the pull-token secret invalidates every outstanding capability
/// token immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Capability (pull) token signing
    #[serde(default)]
    pub pull_token: PullTokenConfig,

    /// Registry-facing bearer token signing
    #[serde(default)]
    pub bearer: BearerTokenConfig,

    /// Service-to-service mint endpoint
    #[serde(default)]
    pub internal: InternalConfig,

    /// Registry host returned to callers of the mint endpoint
    #[serde(default = "default_registry_host")]
    pub registry_host: String,

    /// Realm advertised in the Basic-auth challenge
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Enable Swagger UI
    #[serde(default = "default_true")]
    pub swagger_enabled: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5001))
}

fn default_registry_host() -> String {
    "localhost:5000".to_string()
}

fn default_realm() -> String {
    "PullGate Registry".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            pull_token: PullTokenConfig::default(),
            bearer: BearerTokenConfig::default(),
            internal: InternalConfig::default(),
            registry_host: default_registry_host(),
            realm: default_realm(),
            swagger_enabled: true,
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Check the secrets before serving.
    ///
    /// Refuses unset or short signing secrets, an unset internal API key,
    /// and a bearer secret equal to the pull-token secret.
    pub fn validate(&self) -> Result<(), ApiError> {
        check_secret("pull token secret", &self.pull_token.secret)?;
        check_secret("bearer token secret", &self.bearer.secret)?;

        if self.pull_token.secret == self.bearer.secret {
            error!("Pull token and bearer token secrets must differ");
            return Err(ApiError::Configuration(
                "signing secrets must not be shared".to_string(),
            ));
        }

        if self.internal.api_key.is_empty() {
            error!("Internal API key is not configured");
            return Err(ApiError::Configuration(
                "internal API key is not configured".to_string(),
            ));
        }

        let mint_path = self.internal.mint_path.as_str();
        if !mint_path.starts_with('/')
            || mint_path == "/token"
            || mint_path.starts_with("/health")
            || mint_path.starts_with("/swagger-ui")
            || mint_path.starts_with("/api-docs")
            || !is_static_route(mint_path)
        {
            return Err(ApiError::Configuration(format!(
                "invalid internal mint path '{}'",
                mint_path
            )));
        }

        Ok(())
    }
}

/// A literal route with no empty segments and nothing the router would
/// read as a capture or wildcard.
fn is_static_route(path: &str) -> bool {
    path[1..].split('/').all(|segment| {
        !segment.is_empty()
            && !segment.starts_with(':')
            && !segment.starts_with('*')
            && !segment.contains(['{', '}'])
    })
}

/// Capability token signing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullTokenConfig {
    /// HMAC secret, at least [`MIN_SECRET_LEN`](crate::auth::MIN_SECRET_LEN) bytes
    #[serde(default)]
    pub secret: String,
}

/// Registry bearer token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerTokenConfig {
    /// HMAC secret, must differ from the pull-token secret
    #[serde(default)]
    pub secret: String,

    /// `iss` claim expected by the registry
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// `aud` claim, the registry service name
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_issuer() -> String {
    "pullgate".to_string()
}

fn default_audience() -> String {
    "pullgate-registry".to_string()
}

impl Default for BearerTokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }
}

/// Internal mint endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalConfig {
    /// Shared secret expected in the `X-API-Key` header
    #[serde(default)]
    pub api_key: String,

    /// Route of the mint endpoint
    #[serde(default = "default_mint_path")]
    pub mint_path: String,
}

/// Default route of the internal mint endpoint
pub const DEFAULT_MINT_PATH: &str = "/internal/registry/pull-token";

fn default_mint_path() -> String {
    DEFAULT_MINT_PATH.to_string()
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            mint_path: default_mint_path(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests per second across all clients
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    100
}

fn default_burst() -> u32 {
    50
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Max age for preflight cache (seconds)
    #[serde(default = "default_max_age")]
    pub max_age: u64,
}

fn default_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age: default_max_age(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MIN_SECRET_LEN;

    fn valid_config() -> ApiConfig {
        ApiConfig {
            pull_token: PullTokenConfig {
                secret: "p".repeat(MIN_SECRET_LEN),
            },
            bearer: BearerTokenConfig {
                secret: "b".repeat(MIN_SECRET_LEN),
                ..Default::default()
            },
            internal: InternalConfig {
                api_key: "internal-key".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.bind.port(), 5001);
        assert_eq!(config.registry_host, "localhost:5000");
        assert_eq!(config.internal.mint_path, "/internal/registry/pull-token");
        assert_eq!(config.bearer.issuer, "pullgate");
    }

    #[test]
    fn test_default_config_is_not_servable() {
        let err = ApiConfig::default().validate().unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid_config();
        config.pull_token.secret = "too-short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = valid_config();
        config.bearer.secret = config.pull_token.secret.clone();
        assert!(matches!(
            config.validate(),
            Err(ApiError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_internal_key_rejected() {
        let mut config = valid_config();
        config.internal.api_key.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mint_path_must_not_shadow_public_routes() {
        for path in [
            "internal/mint",
            "/token",
            "/health/mint",
            "/api-docs/x",
            "/",
            "/internal//mint",
            "/internal/mint/",
            "/internal/:app",
            "/internal/*rest",
            "/internal/{app}",
            "/internal/mi}nt",
        ] {
            let mut config = valid_config();
            config.internal.mint_path = path.to_string();
            assert!(config.validate().is_err(), "{} should be rejected", path);
        }
    }

    #[test]
    fn test_custom_static_mint_path_accepted() {
        let mut config = valid_config();
        config.internal.mint_path = "/ops/v2/pull-token".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "pull_token": {"secret": "abc"},
            "internal": {"api_key": "k"},
            "registry_host": "registry.example.com"
        }"#;
        let config: ApiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pull_token.secret, "abc");
        assert_eq!(config.registry_host, "registry.example.com");
        assert_eq!(config.internal.mint_path, "/internal/registry/pull-token");
        assert!(config.rate_limit.enabled);
    }
}
