//! Aggregate progress statistics.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::lines::count_bingos;
use crate::card::Card;

/// Derived progress for a card. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CardStats {
    total_items: usize,
    completed_items: usize,
    completion_rate: f64,
    bingos_achieved: usize,
    first_completion: Option<DateTime<Utc>>,
    last_completion: Option<DateTime<Utc>>,
}

impl CardStats {
    /// Completion as a percentage (0.0-100.0).
    pub fn completion_percent(&self) -> f64 {
        self.completion_rate * 100.0
    }
}

/// Computes stats for a card.
///
/// `completion_rate` is 0.0 for a card with no items.
#[instrument(skip(card), fields(card_id = %card.id()))]
pub fn compute_stats(card: &Card) -> CardStats {
    let total_items = card.item_count();
    let completed: Vec<DateTime<Utc>> = card
        .items()
        .filter(|i| i.is_completed())
        .filter_map(|i| i.completed_at())
        .collect();
    let completed_items = card.items().filter(|i| i.is_completed()).count();
    let completion_rate = if total_items == 0 {
        0.0
    } else {
        completed_items as f64 / total_items as f64
    };
    let bingos_achieved = count_bingos(card);

    debug!(total_items, completed_items, bingos_achieved, "Stats computed");
    CardStats {
        total_items,
        completed_items,
        completion_rate,
        bingos_achieved,
        first_completion: completed.iter().min().copied(),
        last_completion: completed.iter().max().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_card() {
        let stats = compute_stats(&Card::new(2025));
        assert_eq!(*stats.total_items(), 0);
        assert_eq!(*stats.completed_items(), 0);
        assert_eq!(*stats.completion_rate(), 0.0);
        assert_eq!(*stats.bingos_achieved(), 0);
        assert_eq!(*stats.first_completion(), None);
        assert_eq!(*stats.last_completion(), None);
    }

    #[test]
    fn test_first_and_last_completion() {
        let mut card = Card::new(2025);
        for p in 0..3 {
            card.add_item(p, "goal").unwrap();
        }
        let march = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let july = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        card.complete_item_at(2, july, None, None).unwrap();
        card.complete_item_at(0, march, None, None).unwrap();

        let stats = compute_stats(&card);
        assert_eq!(*stats.completed_items(), 2);
        assert_eq!(*stats.first_completion(), Some(march));
        assert_eq!(*stats.last_completion(), Some(july));
        assert!((stats.completion_percent() - 200.0 / 3.0).abs() < 1e-9);
    }
}
