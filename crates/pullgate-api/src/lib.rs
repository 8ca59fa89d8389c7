//! PullGate API - registry pull-token exchange
//!
//! Provides:
//! - Pull capability tokens scoped to one workspace/application repository
//! - The registry Bearer-token handshake (`GET /token`) over Basic auth
//! - A shared-secret internal endpoint that mints pull tokens
//! - OpenAPI documentation with Swagger UI
//! - Rate limiting
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pullgate_api::{ApiConfig, ApiServer, InMemoryCatalog};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = ApiConfig::default();
//!     config.pull_token.secret = std::env::var("PULLGATE_PULL_TOKEN_SECRET")?;
//!     config.bearer.secret = std::env::var("PULLGATE_BEARER_SECRET")?;
//!     config.internal.api_key = std::env::var("PULLGATE_INTERNAL_API_KEY")?;
//!
//!     let server = ApiServer::new(config, Arc::new(InMemoryCatalog::new()));
//!     server.run().await
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod ratelimit;
pub mod router;
pub mod server;

pub use auth::{
    AuthError, BasicCredentials, BearerToken, BearerTokenIssuer, PullToken, PullTokenClaims,
    PullTokenIssuer, PullTokenValidator, PULL_TOKEN_USERNAME, TOKEN_LIFETIME_SECS,
};
pub use catalog::{AppCatalog, AppRecord, CatalogError, InMemoryCatalog};
pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use handlers::internal::{InternalState, MintResponse, INTERNAL_API_KEY_HEADER};
pub use handlers::token::{TokenResponse, TokenState};
pub use openapi::ApiDoc;
pub use ratelimit::{rate_limit_middleware, RateLimitState};
pub use router::build_router;
pub use server::ApiServer;
