//! Capacity invariant: never more items than placeable squares.

use super::Invariant;
use crate::Card;

/// Invariant: item count never exceeds the card's capacity.
pub struct CapacityRespected;

impl Invariant<Card> for CapacityRespected {
    fn holds(card: &Card) -> bool {
        card.item_count() <= card.capacity()
    }

    fn description() -> &'static str {
        "Item count does not exceed capacity"
    }
}
