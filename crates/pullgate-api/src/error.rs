//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error type
///
/// The payload of each variant is a short client-facing message. It must
/// never contain a secret, a token, or an underlying library error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not for the requested resource
    #[error("{0}")]
    Forbidden(String),

    /// Missing or malformed request field
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Unset or unusable secret
    #[error("{0}")]
    Configuration(String),

    /// A collaborator (e.g. the catalog) failed
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("rate limited")]
    RateLimited,
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::RateLimited => "rate_limited",
        }
    }

    /// Client-facing message. Configuration details stay in the server log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Configuration(_) => "server misconfigured".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Short human-readable message
    pub error: String,
    /// Machine-readable code (internal endpoints only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
            code: Some(self.code().to_string()),
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
