//! Card persistence: a repository trait with in-memory and JSON file backends.

mod error;
mod repository;

pub use error::{RepositoryError, RepositoryErrorKind};
pub use repository::{CardRepository, InMemoryCardRepository, JsonFileCardRepository};
