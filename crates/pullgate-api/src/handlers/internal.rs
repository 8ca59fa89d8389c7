//! Internal pull-token minting
//!
//! Called by orchestration workflows, not by registry clients. Calls are
//! authenticated with a shared secret in the `X-API-Key` header.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::auth::{AuthError, PullTokenIssuer, PULL_TOKEN_USERNAME};
use crate::catalog::AppCatalog;
use crate::error::{ApiError, Result};

/// Header carrying the internal shared secret
pub const INTERNAL_API_KEY_HEADER: &str = "X-API-Key";

/// State for internal endpoints
#[derive(Clone)]
pub struct InternalState {
    pub issuer: Arc<PullTokenIssuer>,
    pub catalog: Arc<dyn AppCatalog>,
    /// Shared secret expected from callers
    pub api_key: Arc<str>,
    /// Registry host handed back to callers
    pub registry_host: String,
}

impl InternalState {
    pub fn new(
        issuer: PullTokenIssuer,
        catalog: Arc<dyn AppCatalog>,
        api_key: impl Into<Arc<str>>,
        registry_host: impl Into<String>,
    ) -> Self {
        Self {
            issuer: Arc::new(issuer),
            catalog,
            api_key: api_key.into(),
            registry_host: registry_host.into(),
        }
    }
}

/// Shared-secret extractor. Runs before the body is read, so a bad key is
/// always a 401 whatever the body holds.
pub struct InternalAuth;

impl FromRequestParts<InternalState> for InternalAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &InternalState,
    ) -> std::result::Result<Self, Self::Rejection> {
        if state.api_key.is_empty() {
            error!("Internal API key is not configured");
            return Err(ApiError::Configuration(
                "internal API key is not configured".to_string(),
            ));
        }

        let presented = parts
            .headers
            .get(INTERNAL_API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                warn!("Missing internal API key");
                ApiError::Unauthorized("missing API key".to_string())
            })?;

        if !bool::from(presented.as_bytes().ct_eq(state.api_key.as_bytes())) {
            warn!("Invalid internal API key");
            return Err(ApiError::Unauthorized("invalid API key".to_string()));
        }

        Ok(InternalAuth)
    }
}

/// Mint request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    /// Application to mint a pull token for
    #[serde(default)]
    pub app_id: Option<String>,
}

/// Registry credentials for one application
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintResponse {
    /// Fixed Basic-auth username
    pub username: String,
    /// Pull token, used as the Basic-auth password
    pub password: String,
    /// Registry host to log in to
    pub registry: String,
    /// When the pull token stops working
    #[schema(value_type = String, example = "2026-01-27T13:00:00Z")]
    pub expires_at: DateTime<Utc>,
}

/// Mint a pull token for an application
#[utoipa::path(
    post,
    path = "/internal/registry/pull-token",
    request_body = MintRequest,
    responses(
        (status = 200, description = "Pull credentials", body = MintResponse),
        (status = 400, description = "Missing appId", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = crate::error::ErrorResponse),
        (status = 404, description = "Application or workspace not found", body = crate::error::ErrorResponse),
        (status = 503, description = "Catalog unavailable", body = crate::error::ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "Internal"
)]
pub async fn mint_pull_token(
    _auth: InternalAuth,
    State(state): State<InternalState>,
    body: std::result::Result<Json<MintRequest>, JsonRejection>,
) -> Result<Json<MintResponse>> {
    let Json(request) = body.map_err(|e| {
        warn!(error = %e, "Rejected mint request body");
        ApiError::BadRequest("invalid request body".to_string())
    })?;

    let app_id = request
        .app_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("appId is required".to_string()))?;

    let record = state
        .catalog
        .resolve(&app_id)
        .await
        .map_err(|e| {
            error!(app_id = %app_id, error = %e, "Catalog lookup failed");
            ApiError::ServiceUnavailable("catalog unavailable".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("application not found".to_string()))?;

    let workspace_slug = record
        .workspace_slug
        .filter(|slug| !slug.is_empty())
        .ok_or_else(|| ApiError::NotFound("workspace not found".to_string()))?;

    let minted = match state.issuer.issue(&workspace_slug, &record.app_slug) {
        Ok(minted) => minted,
        Err(AuthError::InvalidSlug(what)) => {
            warn!(app_id = %app_id, slug = what, "Catalog record has an unusable slug");
            let missing = if what == "workspace slug" {
                "workspace not found"
            } else {
                "application not found"
            };
            return Err(ApiError::NotFound(missing.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        app_id = %app_id,
        scope = %minted.claims.scope,
        expires_at = %minted.claims.expires_at(),
        "Minted pull token"
    );

    Ok(Json(MintResponse {
        username: PULL_TOKEN_USERNAME.to_string(),
        password: minted.token,
        registry: state.registry_host.clone(),
        expires_at: minted.claims.expires_at(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_request_deserialize() {
        let request: MintRequest = serde_json::from_str(r#"{"appId": "app-1"}"#).unwrap();
        assert_eq!(request.app_id.as_deref(), Some("app-1"));

        let request: MintRequest = serde_json::from_str("{}").unwrap();
        assert!(request.app_id.is_none());
    }

    #[test]
    fn test_mint_response_serialize() {
        let response = MintResponse {
            username: PULL_TOKEN_USERNAME.to_string(),
            password: "tok".to_string(),
            registry: "registry.example.com".to_string(),
            expires_at: DateTime::from_timestamp(1_700_003_600, 0).unwrap(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["username"], "pull-token");
        assert_eq!(json["password"], "tok");
        assert_eq!(json["registry"], "registry.example.com");
        assert_eq!(json["expiresAt"], "2023-11-14T23:13:20Z");
    }
}
