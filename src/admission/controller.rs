//! Fixed-window admission controller over an external counter store.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

use super::store::{CounterStore, StoreError};
use crate::config::RateLimitConfig;

/// Outcome of one admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct AdmissionDecision {
    /// Whether the request may proceed.
    admitted: bool,
    /// Configured requests per window.
    limit: u64,
    /// Requests left in the current window.
    remaining: u64,
    /// Latest time the current window can end. The fixed-window controller
    /// reports decision time plus the full window, which is an upper bound
    /// on the store's actual expiry, not the expiry itself.
    reset_at: DateTime<Utc>,
    /// True when the store was unreachable and the request was let through.
    fail_open: bool,
}

impl AdmissionDecision {
    pub(crate) fn counted(limit: u64, count: u64, reset_at: DateTime<Utc>) -> Self {
        Self {
            admitted: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at,
            fail_open: false,
        }
    }

    pub(crate) fn open(limit: u64, reset_at: DateTime<Utc>) -> Self {
        Self {
            admitted: true,
            limit,
            remaining: limit,
            reset_at,
            fail_open: true,
        }
    }

    /// Whole seconds until the window resets, never negative.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.reset_at - now).num_seconds()).unwrap_or(0)
    }
}

/// A rate-limit gate keyed by client identity.
#[async_trait]
pub trait AdmissionGate: Send + Sync {
    /// Counts a request for `client_key` and decides whether to admit it.
    async fn check(&self, client_key: &str) -> AdmissionDecision;

    /// Limits this gate enforces.
    fn config(&self) -> &RateLimitConfig;
}

/// Reachability of the counter store as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StoreHealth {
    /// Counts are enforced.
    Healthy,
    /// Requests are admitted without counting.
    Unavailable,
}

/// Fixed-window counter: the first hit in a window sets its expiry.
///
/// Store failures never reach the caller. The controller switches to
/// [`StoreHealth::Unavailable`], admits the request, and logs the
/// transition once. It does not retry and keeps no local counts.
#[derive(Debug)]
pub struct WindowedAdmissionController<S> {
    store: S,
    config: RateLimitConfig,
    unavailable: AtomicBool,
}

impl<S: CounterStore> WindowedAdmissionController<S> {
    /// Creates a controller over `store` enforcing `config`.
    pub fn new(store: S, config: RateLimitConfig) -> Self {
        Self {
            store,
            config,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Store reachability as of the last check.
    pub fn health(&self) -> StoreHealth {
        if self.unavailable.load(Ordering::SeqCst) {
            StoreHealth::Unavailable
        } else {
            StoreHealth::Healthy
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Increments the client's counter and decides.
    ///
    /// Admitted iff the count after increment is within the limit. The
    /// window expiry is set only when the count is 1.
    #[instrument(skip(self), fields(prefix = %self.config.key_prefix()))]
    pub async fn check_and_increment(&self, client_key: &str) -> AdmissionDecision {
        let key = self.config.scoped_key(client_key);
        let window = self.config.window();
        let limit = *self.config.limit();
        let now = Utc::now();
        let reset_at = TimeDelta::from_std(window)
            .ok()
            .and_then(|w| now.checked_add_signed(w))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let count = match self.store.increment(&key).await {
            Ok(count) => count,
            Err(e) => {
                self.mark_unavailable(&e);
                warn!(key = %key, error = %e, "Admitting request without rate limiting");
                return AdmissionDecision::open(limit, reset_at);
            }
        };

        let expiry = if count == 1 {
            self.store.expire(&key, window).await
        } else {
            Ok(())
        };
        match expiry {
            Ok(()) => self.mark_healthy(),
            // The count stands; only the window end is uncertain.
            Err(e) => {
                warn!(
                    key = %key,
                    error = %e,
                    "Window expiry not set; counter may persist until removed by hand"
                );
                self.mark_unavailable(&e);
            }
        }

        let decision = AdmissionDecision::counted(limit, count, reset_at);
        if decision.admitted {
            debug!(count, remaining = decision.remaining, "Request admitted");
        } else {
            info!(key = %key, count, limit, "Request rejected by rate limit");
        }
        decision
    }

    fn mark_unavailable(&self, error: &StoreError) {
        if !self.unavailable.swap(true, Ordering::SeqCst) {
            warn!(
                prefix = %self.config.key_prefix(),
                error = %error,
                "Counter store unavailable, failing open"
            );
        }
    }

    fn mark_healthy(&self) {
        if self.unavailable.swap(false, Ordering::SeqCst) {
            info!(prefix = %self.config.key_prefix(), "Counter store recovered");
        }
    }
}

#[async_trait]
impl<S: CounterStore> AdmissionGate for WindowedAdmissionController<S> {
    async fn check(&self, client_key: &str) -> AdmissionDecision {
        self.check_and_increment(client_key).await
    }

    fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
