//! API router construction

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{BearerTokenIssuer, PullTokenIssuer, PullTokenValidator};
use crate::catalog::AppCatalog;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::handlers;
use crate::handlers::internal::InternalState;
use crate::handlers::token::TokenState;
use crate::openapi::ApiDoc;
use crate::ratelimit::{rate_limit_middleware, RateLimitState};

/// Build the full router.
///
/// Fails with [`ApiError::Configuration`](crate::ApiError::Configuration)
/// rather than serving with unusable secrets.
pub fn build_router(config: &ApiConfig, catalog: Arc<dyn AppCatalog>) -> Result<Router> {
    config.validate()?;

    let token_state = TokenState::new(
        PullTokenValidator::new(&config.pull_token.secret)?,
        BearerTokenIssuer::new(&config.bearer)?,
        config.realm.clone(),
    );

    let internal_state = InternalState::new(
        PullTokenIssuer::new(&config.pull_token.secret)?,
        catalog,
        config.internal.api_key.as_str(),
        config.registry_host.clone(),
    );

    let health_routes = Router::new()
        .route("/live", get(handlers::health::liveness))
        .route("/ready", get(handlers::health::readiness));

    let token_routes = build_token_routes(token_state);
    let internal_routes = build_internal_routes(&config.internal.mint_path, internal_state);

    let mut router = Router::new()
        .nest("/health", health_routes)
        .merge(token_routes)
        .merge(internal_routes);

    if config.swagger_enabled {
        router = router.merge(SwaggerUi::new("/swagger-ui").url(
            "/api-docs/openapi.json",
            ApiDoc::with_mint_path(&config.internal.mint_path),
        ));
    }

    Ok(router
        .layer(middleware::from_fn_with_state(
            RateLimitState::new(&config.rate_limit),
            rate_limit_middleware,
        ))
        .layer(build_cors_layer(config))
        .layer(TraceLayer::new_for_http()))
}

/// Registry-facing token route
pub fn build_token_routes(state: TokenState) -> Router {
    Router::new()
        .route("/token", get(handlers::token::exchange_token))
        .with_state(state)
}

/// Service-to-service mint route
pub fn build_internal_routes(mint_path: &str, state: InternalState) -> Router {
    Router::new()
        .route(mint_path, post(handlers::internal::mint_pull_token))
        .with_state(state)
}

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new().max_age(Duration::from_secs(config.cors.max_age));

    let cors = if config.cors.allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    cors.allow_methods(Any).allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::config::{BearerTokenConfig, InternalConfig, PullTokenConfig};
    use crate::error::ApiError;

    fn config() -> ApiConfig {
        ApiConfig {
            pull_token: PullTokenConfig {
                secret: "pull-token-secret-0123456789abcdef".to_string(),
            },
            bearer: BearerTokenConfig {
                secret: "bearer-token-secret-0123456789abcd".to_string(),
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
    fn test_build_router() {
        assert!(build_router(&config(), Arc::new(InMemoryCatalog::new())).is_ok());
    }

    #[test]
    fn test_build_router_without_swagger() {
        let config = ApiConfig {
            swagger_enabled: false,
            ..config()
        };
        assert!(build_router(&config, Arc::new(InMemoryCatalog::new())).is_ok());
    }

    #[test]
    fn test_build_router_refuses_default_config() {
        let result = build_router(&ApiConfig::default(), Arc::new(InMemoryCatalog::new()));
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn test_build_cors_layer_with_origins() {
        let mut config = config();
        config.cors.allowed_origins = vec![
            "http://localhost:3000".to_string(),
            "https://example.com".to_string(),
        ];
        let _cors = build_cors_layer(&config);
    }
}
