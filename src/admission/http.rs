//! axum middleware that puts an [`AdmissionGate`] in front of routes.

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::client_key::{ClientKey, ForwardedClientKey, RequestMeta};
use super::controller::{AdmissionDecision, AdmissionGate};

/// Body text of a rejection.
pub const RATE_LIMIT_ERROR: &str = "Rate limit exceeded";

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Middleware state: a gate and the key function feeding it.
///
/// Use with [`axum::middleware::from_fn_with_state`] and
/// [`enforce_admission`].
#[derive(Clone)]
pub struct AdmissionLayer {
    gate: Arc<dyn AdmissionGate>,
    key: Arc<dyn ClientKey>,
}

impl fmt::Debug for AdmissionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionLayer")
            .field("key_prefix", self.gate.config().key_prefix())
            .finish_non_exhaustive()
    }
}

impl AdmissionLayer {
    /// Gates requests keyed by [`ForwardedClientKey`].
    pub fn new(gate: Arc<dyn AdmissionGate>) -> Self {
        Self {
            gate,
            key: Arc::new(ForwardedClientKey),
        }
    }

    /// Replaces the key function.
    pub fn with_key(mut self, key: impl ClientKey + 'static) -> Self {
        self.key = Arc::new(key);
        self
    }

    /// The gate consulted per request.
    pub fn gate(&self) -> &Arc<dyn AdmissionGate> {
        &self.gate
    }

    fn key_for(&self, request: &RequestMeta<'_>) -> String {
        let key = self.key.client_key(request);
        if key.is_empty() {
            ForwardedClientKey.client_key(request)
        } else {
            key
        }
    }
}

/// Rate-limit headers for a decision.
///
/// `X-RateLimit-Reset` is a unix timestamp in seconds. `Retry-After` is
/// added only on rejection.
pub fn rate_limit_headers(decision: &AdmissionDecision, now: DateTime<Utc>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(LIMIT_HEADER, HeaderValue::from(*decision.limit()));
    headers.insert(REMAINING_HEADER, HeaderValue::from(*decision.remaining()));
    headers.insert(RESET_HEADER, HeaderValue::from(decision.reset_at().timestamp()));
    if !*decision.admitted() {
        headers.insert(
            axum::http::header::RETRY_AFTER,
            HeaderValue::from(decision.retry_after_secs(now)),
        );
    }
    headers
}

impl AdmissionDecision {
    /// Rate-limit headers for this decision as of now.
    pub fn headers(&self) -> HeaderMap {
        rate_limit_headers(self, Utc::now())
    }
}

/// The 429 response for a rejected request.
pub fn rejection_response(decision: &AdmissionDecision, now: DateTime<Utc>) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        rate_limit_headers(decision, now),
        Json(json!({ "error": RATE_LIMIT_ERROR })),
    )
        .into_response()
}

/// Middleware function: admit or answer 429.
///
/// Admitted responses carry the rate-limit headers too.
#[instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
pub async fn enforce_admission(
    State(layer): State<AdmissionLayer>,
    request: Request,
    next: Next,
) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = layer.key_for(&RequestMeta::new(request.headers(), remote_addr));

    let decision = layer.gate.check(&client).await;
    let now = Utc::now();
    if !*decision.admitted() {
        return rejection_response(&decision, now);
    }

    debug!(client = %client, remaining = *decision.remaining(), "Forwarding admitted request");
    let mut response = next.run(request).await;
    response.headers_mut().extend(rate_limit_headers(&decision, now));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_headers_on_rejection() {
        let now = Utc::now();
        let decision = AdmissionDecision::counted(5, 6, now + TimeDelta::seconds(30));
        let headers = rate_limit_headers(&decision, now);
        assert_eq!(headers["x-ratelimit-limit"], "5");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert_eq!(headers["retry-after"], "30");
    }

    #[test]
    fn test_no_retry_after_when_admitted() {
        let now = Utc::now();
        let decision = AdmissionDecision::counted(5, 1, now + TimeDelta::seconds(30));
        let headers = rate_limit_headers(&decision, now);
        assert_eq!(headers["x-ratelimit-remaining"], "4");
        assert!(headers.get("retry-after").is_none());
    }
}
