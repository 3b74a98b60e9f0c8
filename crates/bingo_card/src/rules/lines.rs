//! Bingo line detection.

use tracing::instrument;

use crate::card::Card;
use crate::grid::{Line, winning_lines};

/// True iff the square counts toward a line: the free space, or a
/// completed item.
pub fn is_position_satisfied(card: &Card, position: usize) -> bool {
    card.is_free_space_position(position) || card.item(position).is_some_and(|i| i.is_completed())
}

/// Every fully completed line, in evaluation order: rows, columns,
/// diagonal, anti-diagonal.
#[instrument(skip(card), fields(card_id = %card.id()))]
pub fn completed_lines(card: &Card) -> Vec<Line> {
    winning_lines(card.grid_size(), card.free_space_position())
        .into_iter()
        .filter(|line| line.is_complete_by(|p| is_position_satisfied(card, p)))
        .collect()
}

/// Number of fully completed lines.
pub fn count_bingos(card: &Card) -> usize {
    completed_lines(card).len()
}
