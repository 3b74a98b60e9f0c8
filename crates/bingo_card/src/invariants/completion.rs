//! Completion invariant: a timestamp exactly when completed.

use super::Invariant;
use crate::Card;

/// Invariant: `completed_at` is set iff `is_completed`.
pub struct CompletionTimestampConsistent;

impl Invariant<Card> for CompletionTimestampConsistent {
    fn holds(card: &Card) -> bool {
        card.items()
            .all(|item| item.is_completed() == item.completed_at().is_some())
    }

    fn description() -> &'static str {
        "Completed items, and only completed items, carry a completion time"
    }
}
