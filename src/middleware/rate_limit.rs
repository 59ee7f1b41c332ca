use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use foodcourtio_shared::{Error, now_unix};

use crate::error::ApiError;
use crate::routes::AppState;

/// Fixed-window per-caller limiter. Keyed by bearer token when present,
/// otherwise a shared anonymous bucket.
pub struct RateLimiter {
    limit_per_minute: u32,
    buckets: DashMap<String, (i64, u32)>,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limit_per_minute,
            buckets: DashMap::new(),
        }
    }

    pub fn allow(&self, key: &str, now: i64) -> bool {
        let minute = now / 60;
        let mut entry = self.buckets.entry(key.to_owned()).or_insert((minute, 0));

        if entry.0 != minute {
            *entry = (minute, 0);
        }
        if entry.1 >= self.limit_per_minute {
            return false;
        }

        entry.1 += 1;
        true
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Provider webhooks are signature-verified and must never be shed.
    if request.uri().path().starts_with("/api/payments/webhooks") {
        return next.run(request).await;
    }

    let key = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("anonymous")
        .to_owned();

    if !state.rate_limiter.allow(&key, now_unix()) {
        return ApiError(Error::RateLimited).into_response();
    }

    next.run(request).await
}
