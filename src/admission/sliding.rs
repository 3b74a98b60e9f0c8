//! In-process sliding-window limiter.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::controller::{AdmissionDecision, AdmissionGate};
use crate::config::RateLimitConfig;

/// Per-key log of admitted request times.
///
/// A request is admitted iff fewer than `limit` requests were admitted in
/// the trailing window. Rejected requests are not logged. Keys whose
/// newest hit has left the window are dropped on every check. State lives
/// in this process only, so separate instances do not share counts.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    log: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter enforcing `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            log: Mutex::new(HashMap::new()),
        }
    }

    /// Drops keys with no requests in the trailing window.
    pub async fn prune(&self) {
        let now = Instant::now();
        let window = self.config.window();
        let mut log = self.log.lock().await;
        log.retain(|_, hits| {
            hits.retain(|t| now.duration_since(*t) < window);
            !hits.is_empty()
        });
    }

    fn drop_idle(log: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
        log.retain(|_, hits| hits.back().is_some_and(|t| now.duration_since(*t) < window));
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.log.lock().await.len()
    }

    fn wall_clock(now: Instant, at: Instant) -> DateTime<Utc> {
        let ahead = at.saturating_duration_since(now);
        TimeDelta::from_std(ahead)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[async_trait]
impl AdmissionGate for SlidingWindowLimiter {
    #[instrument(skip(self), fields(prefix = %self.config.key_prefix()))]
    async fn check(&self, client_key: &str) -> AdmissionDecision {
        let now = Instant::now();
        let window = self.config.window();
        let limit = *self.config.limit();

        let key = self.config.scoped_key(client_key);
        let mut log = self.log.lock().await;
        Self::drop_idle(&mut log, now, window);
        let hits = log.entry(key.clone()).or_default();
        while hits.front().is_some_and(|t| now.duration_since(*t) >= window) {
            hits.pop_front();
        }

        let admitted = (hits.len() as u64) < limit;
        if admitted {
            hits.push_back(now);
        }
        let oldest = hits.front().copied().unwrap_or(now);
        let reset_at = Self::wall_clock(now, oldest + window);
        let count = if admitted {
            hits.len() as u64
        } else {
            limit + 1
        };
        if hits.is_empty() {
            log.remove(&key);
        }
        debug!(count, admitted, "Sliding window checked");
        AdmissionDecision::counted(limit, count, reset_at)
    }

    fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
