//! Request-rate admission control.
//!
//! A gate consulted before sensitive requests. The primary design is a
//! fixed window counter in an external atomic store; a sliding-window log
//! held in-process is the alternative. Both answer with an
//! [`AdmissionDecision`] carrying the metadata for rate-limit headers.

mod client_key;
mod controller;
mod http;
mod sliding;
mod store;

pub use client_key::{ClientKey, ForwardedClientKey, RequestMeta};
pub use controller::{AdmissionDecision, AdmissionGate, StoreHealth, WindowedAdmissionController};
pub use http::{AdmissionLayer, RATE_LIMIT_ERROR, enforce_admission, rate_limit_headers, rejection_response};
pub use sliding::SlidingWindowLimiter;
#[cfg(feature = "redis")]
pub use store::RedisCounterStore;
pub use store::{CounterStore, InMemoryCounterStore, StoreError};
