//! Registry token endpoint
//!
//! Implements the registry's Bearer-token handshake: the client presents a
//! pull token as the Basic-auth password and receives a registry bearer
//! token scoped to exactly the repository the pull token was minted for.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{
    parse_pull_credentials, scopes_match, AuthError, BearerTokenIssuer, PullTokenValidator,
};
use crate::error::{ApiError, ErrorResponse};

/// State for the token endpoint
#[derive(Clone)]
pub struct TokenState {
    pub validator: Arc<PullTokenValidator>,
    pub bearer: Arc<BearerTokenIssuer>,
    /// Realm advertised in the Basic challenge
    pub realm: String,
}

impl TokenState {
    pub fn new(validator: PullTokenValidator, bearer: BearerTokenIssuer, realm: String) -> Self {
        Self {
            validator: Arc::new(validator),
            bearer: Arc::new(bearer),
            realm,
        }
    }
}

/// Query parameters sent by registry clients
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    /// Requested scope, e.g. `repository:acme/web:pull`
    pub scope: Option<String>,
    /// Registry service name; informational only
    pub service: Option<String>,
}

/// Token response, per the registry token-service contract
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Registry bearer token
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    /// Issuance time (RFC 3339)
    #[schema(value_type = String, example = "2026-01-27T12:00:00Z")]
    pub issued_at: DateTime<Utc>,
}

/// Error returned to registry clients: `{error}` only, with a Basic
/// challenge when no credentials were sent.
#[derive(Debug)]
pub struct RegistryAuthError {
    error: ApiError,
    challenge: Option<String>,
}

impl RegistryAuthError {
    fn challenge(realm: &str) -> Self {
        Self {
            error: ApiError::Unauthorized("authentication required".to_string()),
            challenge: Some(format!("Basic realm=\"{}\"", realm.replace('"', "\\\""))),
        }
    }
}

impl From<ApiError> for RegistryAuthError {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            challenge: None,
        }
    }
}

impl From<AuthError> for RegistryAuthError {
    fn from(error: AuthError) -> Self {
        ApiError::from(error).into()
    }
}

impl IntoResponse for RegistryAuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error.public_message(),
            code: None,
        };
        let mut response = (self.error.status(), Json(body)).into_response();

        if let Some(value) = self
            .challenge
            .and_then(|challenge| HeaderValue::from_str(&challenge).ok())
        {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }

        response
    }
}

/// Exchange a pull token for a registry bearer token
#[utoipa::path(
    get,
    path = "/token",
    params(TokenQuery),
    responses(
        (status = 200, description = "Bearer token issued", body = TokenResponse),
        (status = 400, description = "Missing scope", body = ErrorResponse),
        (status = 401, description = "Missing, malformed or invalid credentials", body = ErrorResponse),
        (status = 403, description = "Scope not covered by the pull token", body = ErrorResponse),
    ),
    security(("basic_auth" = [])),
    tag = "Registry"
)]
pub async fn exchange_token(
    State(state): State<TokenState>,
    headers: HeaderMap,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, RegistryAuthError> {
    let header = match headers.get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::MalformedAuthHeader("non-ascii header"))?,
        None => {
            debug!("Token request without credentials, sending challenge");
            return Err(RegistryAuthError::challenge(&state.realm));
        }
    };

    let credentials = parse_pull_credentials(header)?;
    let claims = state.validator.validate(&credentials.password)?;

    let Query(query) = query.map_err(|e| {
        warn!(error = %e, "Rejected token request query");
        ApiError::BadRequest("invalid query".to_string())
    })?;

    let requested = query
        .scope
        .filter(|scope| !scope.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing scope".to_string()))?;

    if !scopes_match(&claims.scope, &requested) {
        warn!(
            granted = %claims.scope,
            requested = %requested,
            "Requested scope not covered by pull token"
        );
        return Err(ApiError::Forbidden("scope not authorized".to_string()).into());
    }

    let bearer = state.bearer.issue(&requested)?;

    info!(
        scope = %requested,
        service = query.service.as_deref().unwrap_or("-"),
        "Issued registry bearer token"
    );

    Ok(Json(TokenResponse {
        token: bearer.token,
        expires_in: bearer.expires_in,
        issued_at: bearer.issued_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_token_response_serialize() {
        let response = TokenResponse {
            token: "abc".to_string(),
            expires_in: 3600,
            issued_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["expires_in"], 3600);
        assert_eq!(json["issued_at"], "2023-11-14T22:13:20Z");
    }

    #[tokio::test]
    async fn test_challenge_response() {
        let response = RegistryAuthError::challenge("PullGate Registry").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"PullGate Registry\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "authentication required");
        assert!(json.get("code").is_none());
    }

    #[test]
    fn test_challenge_escapes_realm() {
        let err = RegistryAuthError::challenge("a\"b");
        assert_eq!(err.challenge.as_deref(), Some("Basic realm=\"a\\\"b\""));
    }

    #[test]
    fn test_forbidden_has_no_challenge() {
        let response =
            RegistryAuthError::from(ApiError::Forbidden("scope not authorized".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
