//! Global request rate limiting
//!
//! One `governor` limiter shared by every route. Token exchange is CPU-only
//! and cheap, so this only guards against request floods.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::error::ApiError;

const FALLBACK_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

const FALLBACK_BURST: NonZeroU32 = match NonZeroU32::new(50) {
    Some(n) => n,
    None => unreachable!(),
};

/// Build a limiter; zero values fall back to the defaults
pub fn create_limiter(config: &RateLimitConfig) -> Arc<DefaultDirectRateLimiter> {
    let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(FALLBACK_RPS);
    let burst = NonZeroU32::new(config.burst_size).unwrap_or(FALLBACK_BURST);

    Arc::new(RateLimiter::direct(Quota::per_second(rps).allow_burst(burst)))
}

/// Rate limit state for middleware
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl RateLimitState {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            limiter: config.enabled.then(|| create_limiter(config)),
        }
    }

    /// True if the request may proceed
    pub fn check(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }
}

/// Rejects with 429 once the limiter is exhausted
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.check() {
        warn!(path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_limited() {
        let state = RateLimitState::new(&RateLimitConfig {
            enabled: true,
            requests_per_second: 1,
            burst_size: 3,
        });

        for _ in 0..3 {
            assert!(state.check());
        }
        assert!(!state.check());
    }

    #[test]
    fn test_disabled_always_allows() {
        let state = RateLimitState::new(&RateLimitConfig {
            enabled: false,
            requests_per_second: 1,
            burst_size: 1,
        });

        for _ in 0..100 {
            assert!(state.check());
        }
    }

    #[test]
    fn test_zero_values_fall_back() {
        let limiter = create_limiter(&RateLimitConfig {
            enabled: true,
            requests_per_second: 0,
            burst_size: 0,
        });
        assert!(limiter.check().is_ok());
    }
}
