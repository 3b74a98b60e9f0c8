//! Read-side rules over a populated card.
//!
//! Pure projections: nothing here mutates the card.

pub mod lines;
pub mod stats;

pub use lines::{completed_lines, count_bingos, is_position_satisfied};
pub use stats::{CardStats, compute_stats};
