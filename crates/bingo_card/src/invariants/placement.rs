//! Placement invariant: items sit on the grid, off the free space.

use super::Invariant;
use crate::Card;

/// Invariant: every item is on a valid item position and keyed by it.
pub struct ItemsPlaceable;

impl Invariant<Card> for ItemsPlaceable {
    fn holds(card: &Card) -> bool {
        card.items_map()
            .iter()
            .all(|(key, item)| *key == item.position() && card.is_valid_item_position(*key))
    }

    fn description() -> &'static str {
        "Items are on the grid and never on the free space"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_for_placed_items() {
        let mut card = Card::new(2025);
        card.add_item(0, "a").unwrap();
        card.add_item(24, "b").unwrap();
        assert!(ItemsPlaceable::holds(&card));
    }

    #[test]
    fn test_detects_item_on_free_space() {
        let mut card = Card::new(2025);
        card.add_item(0, "a").unwrap();
        card.force_move(0, 12);
        assert!(!ItemsPlaceable::holds(&card));
        card.force_move(12, 40);
        assert!(!ItemsPlaceable::holds(&card));
    }
}
