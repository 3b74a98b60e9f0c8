//! Repository error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RepositoryErrorKind {
    /// No card with the requested id.
    #[display("not found")]
    NotFound,
    /// Reading, writing, or decoding failed.
    #[display("storage")]
    Storage,
}

/// Repository error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Repository error ({}): {} at {}:{}", kind, message, file, line)]
pub struct RepositoryError {
    /// Failure class.
    pub kind: RepositoryErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RepositoryError {
    /// Creates a storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(RepositoryErrorKind::Storage, message)
    }

    /// Creates a not-found error for `what`.
    #[track_caller]
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::with_kind(RepositoryErrorKind::NotFound, format!("Card {} not found", what))
    }

    #[track_caller]
    fn with_kind(kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// True for [`RepositoryErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.kind == RepositoryErrorKind::NotFound
    }
}

impl From<std::io::Error> for RepositoryError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for RepositoryError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {}", err))
    }
}
