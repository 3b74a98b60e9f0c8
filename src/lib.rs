//! Yearly Bingo - card service and request admission control
//!
//! Builds on the [`bingo_card`] domain engine with the pieces a deployment
//! needs around it.
//!
//! # Architecture
//!
//! - **Service**: load, apply an action, save, and derive stats
//! - **Repository**: in-memory or one-JSON-file-per-card storage
//! - **Admission**: fixed-window counters in an external store that fail
//!   open, an in-process sliding window, and axum middleware for both
//! - **Config**: TOML file with named rate-limit scopes
//!
//! # Example
//!
//! ```no_run
//! use yearly_bingo::{CardService, InMemoryCardRepository, NewCard};
//! use bingo_card::CardAction;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = CardService::new(InMemoryCardRepository::new());
//! let view = service.create_card(NewCard::new(2025)).await?;
//! let id = view.card().id();
//! service
//!     .apply(id, CardAction::AddItem { position: Some(0), content: "Run a 10k".into() })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod service;

pub mod admission;

// Crate-level exports - Configuration
pub use config::{AppConfig, CONFIG_ENV_VAR, ConfigError, RateLimitConfig};

// Crate-level exports - Persistence
pub use db::{CardRepository, InMemoryCardRepository, JsonFileCardRepository, RepositoryError, RepositoryErrorKind};

// Crate-level exports - Service
pub use service::{CardService, CardView, NewCard, ServiceError};

// Crate-level exports - Admission
#[cfg(feature = "redis")]
pub use admission::RedisCounterStore;
pub use admission::{
    AdmissionDecision, AdmissionGate, AdmissionLayer, ClientKey, CounterStore, ForwardedClientKey,
    InMemoryCounterStore, SlidingWindowLimiter, StoreHealth, WindowedAdmissionController, enforce_admission,
};
