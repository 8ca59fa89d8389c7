//! OpenAPI documentation

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::config::DEFAULT_MINT_PATH;
use crate::error::ErrorResponse;
use crate::handlers::health::{HealthResponse, __path_liveness, __path_readiness};
use crate::handlers::internal::{
    MintRequest, MintResponse, __path_mint_pull_token, INTERNAL_API_KEY_HEADER,
};
use crate::handlers::token::{TokenResponse, __path_exchange_token};

/// Registers Basic auth for `/token` and the API key for internal routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(INTERNAL_API_KEY_HEADER))),
            );
        }
    }
}

/// PullGate OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PullGate API",
        description = "Registry pull-token exchange service",
        version = "0.1.0",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(liveness, readiness, exchange_token, mint_pull_token),
    components(schemas(HealthResponse, TokenResponse, MintRequest, MintResponse, ErrorResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Registry", description = "Registry token handshake"),
        (name = "Internal", description = "Service-to-service endpoints"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// The document with the mint endpoint listed under the route it is
    /// actually mounted on.
    pub fn with_mint_path(mint_path: &str) -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if mint_path != DEFAULT_MINT_PATH {
            if let Some(item) = doc.paths.paths.remove(DEFAULT_MINT_PATH) {
                doc.paths.paths.insert(mint_path.to_string(), item);
            }
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "PullGate API");
        assert!(doc.paths.paths.contains_key("/token"));
        assert!(doc.paths.paths.contains_key(DEFAULT_MINT_PATH));
    }

    #[test]
    fn test_openapi_custom_mint_path() {
        let doc = ApiDoc::with_mint_path("/ops/pull-token");
        assert!(doc.paths.paths.contains_key("/ops/pull-token"));
        assert!(!doc.paths.paths.contains_key(DEFAULT_MINT_PATH));
        assert!(doc.paths.paths.contains_key("/token"));
    }

    #[test]
    fn test_openapi_security_schemes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("should have components");
        assert!(components.security_schemes.contains_key("basic_auth"));
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
