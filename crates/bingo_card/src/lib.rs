//! Bingo card domain engine.
//!
//! Pure, synchronous rules for yearly goal bingo cards:
//!
//! - **Grid**: position geometry and the fixed set of winning lines
//! - **Card**: items, free space, and placement rules
//! - **Rules**: completed-line detection and progress statistics
//! - **Lifecycle**: draft → finalized → archived
//! - **Actions**: serializable mutations applied under contracts
//!
//! # Example
//!
//! ```
//! use bingo_card::{Card, compute_stats};
//!
//! let mut card = Card::with_grid(2025, 3, true).unwrap();
//! for p in card.unused_positions() {
//!     card.add_item(p, format!("Goal {p}")).unwrap();
//! }
//! card.finalize().unwrap();
//! for p in [0, 4, 8] {
//!     if card.item(p).is_some() {
//!         card.complete_item(p, None, None).unwrap();
//!     }
//! }
//! assert_eq!(*compute_stats(&card).bingos_achieved(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod card;
mod category;
mod error;
mod item;
mod lifecycle;

pub mod contracts;
pub mod grid;
pub mod invariants;
pub mod rules;

pub use action::CardAction;
pub use card::{Card, CardId};
pub use category::{Category, is_valid_category};
pub use error::CardError;
pub use grid::{
    Line, LineKind, col_of, default_free_space_position, default_header_text, is_valid_grid_size,
    row_of, winning_lines,
};
pub use item::Item;
pub use lifecycle::LifecycleState;
pub use rules::{CardStats, completed_lines, compute_stats, count_bingos};
