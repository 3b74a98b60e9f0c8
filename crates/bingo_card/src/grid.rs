//! Grid geometry for square bingo cards.
//!
//! Positions are row-major and 0-indexed. Every function here is pure and
//! parameterized by the grid size, so the same rules serve 2x2 through 5x5
//! cards.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CardError;

/// Smallest supported grid size.
pub const MIN_GRID_SIZE: usize = 2;

/// Largest supported grid size.
pub const MAX_GRID_SIZE: usize = 5;

/// Grid size used when none is requested.
pub const DEFAULT_GRID_SIZE: usize = 5;

/// Center of the standard 5x5 card.
pub const STANDARD_FREE_SPACE: usize = 12;

const HEADER_LETTERS: &str = "BINGO";

/// Returns true iff `n` is a supported grid size (2 through 5).
pub fn is_valid_grid_size(n: usize) -> bool {
    (MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&n)
}

/// Number of squares on a grid of the given size, saturating at `usize::MAX`.
pub fn total_squares(size: usize) -> usize {
    size.saturating_mul(size)
}

fn check_position(position: usize, size: usize) -> Result<(), CardError> {
    match size.checked_mul(size) {
        Some(total) if position < total => Ok(()),
        _ => Err(CardError::InvalidPosition(position)),
    }
}

/// Row of a position.
///
/// # Errors
///
/// Returns [`CardError::InvalidPosition`] if the position is off the grid.
pub fn row_of(position: usize, size: usize) -> Result<usize, CardError> {
    check_position(position, size)?;
    Ok(position / size)
}

/// Column of a position.
///
/// # Errors
///
/// Returns [`CardError::InvalidPosition`] if the position is off the grid.
pub fn col_of(position: usize, size: usize) -> Result<usize, CardError> {
    check_position(position, size)?;
    Ok(position % size)
}

/// Position of a `(row, col)` pair.
///
/// # Errors
///
/// Returns [`CardError::InvalidPosition`] if either coordinate is off the grid.
pub fn position_of(row: usize, col: usize, size: usize) -> Result<usize, CardError> {
    if row >= size || col >= size {
        return Err(CardError::InvalidPosition(row.saturating_mul(size).saturating_add(col)));
    }
    Ok(row * size + col)
}

/// Column header for display: the first `size` letters of "BINGO".
pub fn default_header_text(size: usize) -> String {
    HEADER_LETTERS.chars().take(size).collect()
}

/// Center square for odd grid sizes.
///
/// Even, zero, or otherwise unsupported sizes fall back to the standard
/// 5x5 center (12) instead of failing. Cards never ask for a free space on
/// those sizes, so the fallback only reaches legacy callers.
pub fn default_free_space_position(size: usize) -> usize {
    if is_valid_grid_size(size) && size % 2 == 1 {
        (total_squares(size) - 1) / 2
    } else {
        STANDARD_FREE_SPACE
    }
}

/// Which kind of line a [`Line`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum LineKind {
    /// A full row (0-indexed from the top).
    Row(usize),
    /// A full column (0-indexed from the left).
    Column(usize),
    /// Top-left to bottom-right.
    Diagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineKind::Row(i) => write!(f, "row {}", i + 1),
            LineKind::Column(i) => write!(f, "column {}", i + 1),
            LineKind::Diagonal => write!(f, "diagonal"),
            LineKind::AntiDiagonal => write!(f, "anti-diagonal"),
        }
    }
}

/// A winning line: an ordered sequence of positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    kind: LineKind,
    positions: Vec<usize>,
    free_space: Option<usize>,
}

impl Line {
    /// Which row, column, or diagonal this is.
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// Every position on the line, in order.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Positions that need a completed item; the free space is excluded.
    pub fn required_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions
            .iter()
            .copied()
            .filter(move |p| Some(*p) != self.free_space)
    }

    /// True iff every required position satisfies `completed`.
    pub fn is_complete_by(&self, completed: impl Fn(usize) -> bool) -> bool {
        self.required_positions().all(completed)
    }
}

/// All winning lines for a grid: rows, then columns, then the two diagonals.
///
/// Produces `2 * size + 2` lines for supported sizes and none otherwise.
/// `free_space` marks the square that counts as satisfied on every line
/// passing through it.
#[instrument]
pub fn winning_lines(size: usize, free_space: Option<usize>) -> Vec<Line> {
    if !is_valid_grid_size(size) {
        return Vec::new();
    }
    let free_space = free_space.filter(|p| *p < total_squares(size));
    let line = |kind, positions: Vec<usize>| Line {
        kind,
        free_space: free_space.filter(|p| positions.contains(p)),
        positions,
    };

    let mut lines = Vec::with_capacity(2 * size + 2);
    for row in 0..size {
        lines.push(line(LineKind::Row(row), (0..size).map(|col| row * size + col).collect()));
    }
    for col in 0..size {
        lines.push(line(LineKind::Column(col), (0..size).map(|row| row * size + col).collect()));
    }
    lines.push(line(LineKind::Diagonal, (0..size).map(|i| i * size + i).collect()));
    lines.push(line(
        LineKind::AntiDiagonal,
        (0..size).map(|i| i * size + (size - 1 - i)).collect(),
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_bounds() {
        for n in 2..=5 {
            assert!(is_valid_grid_size(n));
        }
        for n in [0, 1, 6, 7, 100] {
            assert!(!is_valid_grid_size(n));
        }
    }

    #[test]
    fn test_center_of_standard_card() {
        assert_eq!(default_free_space_position(5), 12);
        assert_eq!(row_of(12, 5), Ok(2));
        assert_eq!(col_of(12, 5), Ok(2));
        assert_eq!(default_free_space_position(3), 4);
    }

    #[test]
    fn test_free_space_fallback_for_even_and_invalid_sizes() {
        assert_eq!(default_free_space_position(4), STANDARD_FREE_SPACE);
        assert_eq!(default_free_space_position(2), STANDARD_FREE_SPACE);
        assert_eq!(default_free_space_position(0), STANDARD_FREE_SPACE);
        assert_eq!(default_free_space_position(7), STANDARD_FREE_SPACE);
    }

    #[test]
    fn test_row_col_reject_off_grid() {
        assert_eq!(row_of(25, 5), Err(CardError::InvalidPosition(25)));
        assert_eq!(col_of(9, 3), Err(CardError::InvalidPosition(9)));
        assert_eq!(row_of(0, 0), Err(CardError::InvalidPosition(0)));
    }

    #[test]
    fn test_huge_sizes_do_not_overflow() {
        let size = 1usize << 33;
        assert_eq!(row_of(0, size), Err(CardError::InvalidPosition(0)));
        assert_eq!(col_of(7, size), Err(CardError::InvalidPosition(7)));
        assert_eq!(total_squares(size), usize::MAX);
        assert!(winning_lines(size, None).is_empty());
        assert!(winning_lines(6, None).is_empty());
    }

    #[test]
    fn test_position_of_inverts_row_col() {
        for p in 0..16 {
            let (r, c) = (row_of(p, 4).unwrap(), col_of(p, 4).unwrap());
            assert_eq!(position_of(r, c, 4), Ok(p));
        }
        assert!(position_of(4, 0, 4).is_err());
    }

    #[test]
    fn test_header_text() {
        assert_eq!(default_header_text(3), "BIN");
        assert_eq!(default_header_text(5), "BINGO");
        assert_eq!(default_header_text(2), "BI");
    }

    #[test]
    fn test_standard_lines() {
        let lines = winning_lines(5, Some(12));
        assert_eq!(lines.len(), 12);
        assert!(lines.iter().all(|l| l.positions().len() == 5));
        assert_eq!(lines[0].positions(), &[0, 1, 2, 3, 4]);
        assert_eq!(lines[5].positions(), &[0, 5, 10, 15, 20]);
        assert_eq!(lines[10].kind(), LineKind::Diagonal);
        assert_eq!(lines[10].positions(), &[0, 6, 12, 18, 24]);
        assert_eq!(lines[11].kind(), LineKind::AntiDiagonal);
        assert_eq!(lines[11].positions(), &[4, 8, 12, 16, 20]);
    }

    #[test]
    fn test_free_space_excluded_from_required() {
        let lines = winning_lines(5, Some(12));
        let diagonal: Vec<_> = lines[10].required_positions().collect();
        assert_eq!(diagonal, vec![0, 6, 18, 24]);
        let top: Vec<_> = lines[0].required_positions().collect();
        assert_eq!(top, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_line_count_scales_with_size() {
        for size in 2..=5 {
            assert_eq!(winning_lines(size, None).len(), 2 * size + 2);
        }
    }
}
