//! Atomic counter stores backing the windowed admission controller.

use async_trait::async_trait;
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Counter store failure.
#[derive(Debug, Clone, Display, Error)]
#[display("Counter store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// External atomic counter with per-key expiry.
///
/// `increment` must be atomic across concurrent callers sharing a key.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Adds one to the counter and returns the new value.
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// Sets the counter to expire after `ttl`.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: CounterStore + ?Sized> CounterStore for Arc<S> {
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        (**self).increment(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        (**self).expire(key, ttl).await
    }
}

#[derive(Debug)]
struct Counter {
    count: u64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process counter store honouring TTLs.
///
/// Serves tests and single-instance deployments. Expired counters are
/// dropped on every increment, so memory tracks the clients seen within
/// one window. It can be switched into
/// an outage mode where every call fails, to exercise fail-open paths.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, Counter>>,
    unavailable: AtomicBool,
}

impl InMemoryCounterStore {
    /// Creates an empty, available store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the store going down (`true`) or recovering (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of counters held, expired or not.
    pub async fn tracked_keys(&self) -> usize {
        self.counters.lock().await.len()
    }

    /// Current value for a key, ignoring expired counters.
    pub async fn current(&self, key: &str) -> Option<u64> {
        let now = Instant::now();
        let counters = self.counters.lock().await;
        counters
            .get(key)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.count)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::new("in-memory counter store is unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    #[instrument(skip(self))]
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        self.check_available()?;
        let now = Instant::now();
        let mut counters = self.counters.lock().await;
        let before = counters.len();
        counters.retain(|_, c| !c.is_expired(now));
        if counters.len() < before {
            debug!(dropped = before - counters.len(), "Expired counters dropped");
        }
        let counter = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: None,
        });
        counter.count += 1;
        Ok(counter.count)
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        let mut counters = self.counters.lock().await;
        if let Some(counter) = counters.get_mut(key) {
            counter.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

/// Redis-backed counter store using `INCR` and `EXPIRE`.
#[cfg(feature = "redis")]
#[derive(Debug, Clone)]
pub struct RedisCounterStore {
    client: redis::Client,
}

#[cfg(feature = "redis")]
impl RedisCounterStore {
    /// Opens a client for the given URL. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the URL is invalid.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    #[track_caller]
    fn from(err: redis::RedisError) -> Self {
        Self::new(format!("Redis error: {}", err))
    }
}

#[cfg(feature = "redis")]
#[async_trait]
impl CounterStore for RedisCounterStore {
    #[instrument(skip(self))]
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let count: u64 = conn.incr(key, 1_u64).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let secs = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);
        let _: bool = conn.expire(key, secs).await?;
        Ok(())
    }
}
