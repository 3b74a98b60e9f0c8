//! Domain errors for bingo card operations.
//!
//! Every variant is a recoverable validation failure. The handler layer
//! maps them to user-facing responses; nothing here is fatal.

use crate::lifecycle::LifecycleState;

/// Error that can occur when validating or applying a card operation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum CardError {
    /// The position is outside the grid or is the free space.
    #[display("Position {} is not a valid item position", _0)]
    InvalidPosition(usize),

    /// An item already occupies the position.
    #[display("Position {} is already occupied", _0)]
    DuplicatePosition(usize),

    /// Every placeable square already holds an item.
    #[display("Card is full ({} items)", capacity)]
    CardFull {
        /// Number of placeable squares on the card.
        capacity: usize,
    },

    /// Structural changes are only allowed while the card is a draft.
    #[display("Card is {} and its layout can no longer change", _0)]
    CardFinalized(LifecycleState),

    /// The card cannot be finalized until every square is filled.
    #[display("Card needs {} items to finalize, has {}", capacity, placed)]
    InsufficientItems {
        /// Items currently placed.
        placed: usize,
        /// Items required.
        capacity: usize,
    },

    /// No item sits at the position.
    #[display("No item at position {}", _0)]
    ItemNotFound(usize),

    /// Grid size outside the supported range.
    #[display("Grid size {} is not supported (expected 2-5)", _0)]
    InvalidGridSize(usize),

    /// Category name is not one of the curated categories.
    #[display("Unknown category '{}'", _0)]
    InvalidCategory(String),

    /// Item content was empty or whitespace.
    #[display("Item content must not be empty")]
    EmptyContent,

    /// Free space was requested on a grid without a center square.
    #[display("A {}x{} grid has no center square for a free space", _0, _0)]
    FreeSpaceUnavailable(usize),

    /// The lifecycle does not allow moving between these states.
    #[display("Cannot move card from {} to {}", from, to)]
    InvalidTransition {
        /// Current state.
        from: LifecycleState,
        /// Requested state.
        to: LifecycleState,
    },

    /// A card invariant failed, after a mutation in debug builds or while
    /// loading stored data.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for CardError {}
