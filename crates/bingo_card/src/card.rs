//! The card aggregate: grid configuration, items, and lifecycle.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::category::Category;
use crate::contracts::{CardHasRoom, PlaceItem, StructureIsMutable};
use crate::error::CardError;
use crate::grid::{self, DEFAULT_GRID_SIZE};
use crate::invariants::{CardInvariants, InvariantSet};
use crate::item::Item;
use crate::lifecycle::LifecycleState;

/// Unique identifier for a card.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct CardId(uuid::Uuid);

impl CardId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

/// A user's yearly grid of goals.
///
/// Deserialization validates the grid configuration and every card
/// invariant, so stored data cannot produce a card the API could not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCard")]
pub struct Card {
    id: CardId,
    grid_size: usize,
    has_free_space: bool,
    free_space_position: Option<usize>,
    title: Option<String>,
    year: i32,
    category: Option<Category>,
    lifecycle_state: LifecycleState,
    #[serde(serialize_with = "item_list::serialize")]
    items: BTreeMap<usize, Item>,
}

/// Unvalidated wire form of a [`Card`].
#[derive(Deserialize)]
struct RawCard {
    id: CardId,
    grid_size: usize,
    has_free_space: bool,
    free_space_position: Option<usize>,
    title: Option<String>,
    year: i32,
    category: Option<Category>,
    lifecycle_state: LifecycleState,
    #[serde(deserialize_with = "item_list::deserialize")]
    items: BTreeMap<usize, Item>,
}

impl TryFrom<RawCard> for Card {
    type Error = CardError;

    fn try_from(raw: RawCard) -> Result<Self, Self::Error> {
        let expected = free_space_for(raw.grid_size, raw.has_free_space)?;
        if raw.free_space_position != expected {
            return Err(CardError::InvariantViolation(format!(
                "free space at {:?} does not match a {}x{} grid (expected {:?})",
                raw.free_space_position, raw.grid_size, raw.grid_size, expected
            )));
        }
        if let Some(blank) = raw.items.values().find(|i| i.content().trim().is_empty()) {
            return Err(CardError::InvariantViolation(format!(
                "item at {} has no content",
                blank.position()
            )));
        }

        let card = Self {
            id: raw.id,
            grid_size: raw.grid_size,
            has_free_space: raw.has_free_space,
            free_space_position: raw.free_space_position,
            title: raw.title,
            year: raw.year,
            category: raw.category,
            lifecycle_state: raw.lifecycle_state,
            items: raw.items,
        };
        card.check_invariants()?;
        if !card.lifecycle_state.is_structurally_mutable() && card.items.len() != card.capacity() {
            return Err(CardError::InsufficientItems {
                placed: card.items.len(),
                capacity: card.capacity(),
            });
        }
        Ok(card)
    }
}

impl Card {
    /// Creates an empty 5x5 draft card with a free space.
    #[instrument]
    pub fn new(year: i32) -> Self {
        Self {
            id: CardId::new(),
            grid_size: DEFAULT_GRID_SIZE,
            has_free_space: true,
            free_space_position: Some(grid::default_free_space_position(DEFAULT_GRID_SIZE)),
            title: None,
            year,
            category: None,
            lifecycle_state: LifecycleState::Draft,
            items: BTreeMap::new(),
        }
    }

    /// Creates an empty draft card with the given grid configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidGridSize`] for sizes outside 2-5 and
    /// [`CardError::FreeSpaceUnavailable`] when a free space is requested on
    /// an even grid.
    #[instrument]
    pub fn with_grid(year: i32, grid_size: usize, has_free_space: bool) -> Result<Self, CardError> {
        let free_space_position = free_space_for(grid_size, has_free_space)?;
        Ok(Self {
            grid_size,
            has_free_space,
            free_space_position,
            ..Self::new(year)
        })
    }

    /// Card id.
    pub fn id(&self) -> CardId {
        self.id
    }

    /// Side length of the grid.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Whether the card has a free space.
    pub fn has_free_space(&self) -> bool {
        self.has_free_space
    }

    /// Position of the free space, present iff the card has one.
    pub fn free_space_position(&self) -> Option<usize> {
        self.free_space_position
    }

    /// Optional title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Year the card is for.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Optional category.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Current lifecycle state.
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle_state
    }

    /// Items ordered by position.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Item at a position, if any.
    pub fn item(&self, position: usize) -> Option<&Item> {
        self.items.get(&position)
    }

    /// Number of placed items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// `grid_size` squared.
    pub fn total_squares(&self) -> usize {
        grid::total_squares(self.grid_size)
    }

    /// Number of squares that can hold an item.
    pub fn capacity(&self) -> usize {
        if self.has_free_space {
            self.total_squares() - 1
        } else {
            self.total_squares()
        }
    }

    /// True iff the card has a free space and `position` is it.
    pub fn is_free_space_position(&self, position: usize) -> bool {
        self.has_free_space && self.free_space_position == Some(position)
    }

    /// True iff `position` is on the grid and not the free space.
    pub fn is_valid_item_position(&self, position: usize) -> bool {
        position < self.total_squares() && !self.is_free_space_position(position)
    }

    /// True iff an item sits at `position`.
    pub fn is_occupied(&self, position: usize) -> bool {
        self.items.contains_key(&position)
    }

    /// True iff every placeable square holds an item.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity()
    }

    /// Title if set and non-empty, otherwise "{year} Bingo Card".
    pub fn display_name(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("{} Bingo Card", self.year),
        }
    }

    /// Placeable squares with no item yet, in position order.
    pub fn unused_positions(&self) -> Vec<usize> {
        (0..self.total_squares())
            .filter(|p| self.is_valid_item_position(*p) && !self.is_occupied(*p))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    //  Structural mutations (draft only)
    // ─────────────────────────────────────────────────────────────

    /// Places a new incomplete item.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] outside draft, [`CardError::InvalidPosition`]
    /// off-grid or on the free space, [`CardError::CardFull`] at capacity,
    /// [`CardError::DuplicatePosition`] if occupied, and
    /// [`CardError::EmptyContent`] for blank text.
    #[instrument(skip(self, content), fields(card_id = %self.id))]
    pub fn add_item(&mut self, position: usize, content: impl Into<String>) -> Result<&Item, CardError> {
        PlaceItem::check(self, position)?;
        let item = Item::new(position, content)?;
        debug!(position, "Item placed");
        Ok(&*self.items.entry(position).or_insert(item))
    }

    /// Removes and returns the item at `position`.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] outside draft, [`CardError::ItemNotFound`]
    /// if the square is empty.
    #[instrument(skip(self), fields(card_id = %self.id))]
    pub fn remove_item(&mut self, position: usize) -> Result<Item, CardError> {
        StructureIsMutable::check(self)?;
        let item = self
            .items
            .remove(&position)
            .ok_or(CardError::ItemNotFound(position))?;
        debug!(position, "Item removed");
        Ok(item)
    }

    /// Replaces the text of an item.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] outside draft, [`CardError::ItemNotFound`],
    /// or [`CardError::EmptyContent`].
    #[instrument(skip(self, content), fields(card_id = %self.id))]
    pub fn update_item_content(
        &mut self,
        position: usize,
        content: impl Into<String>,
    ) -> Result<&Item, CardError> {
        StructureIsMutable::check(self)?;
        let item = self.item_mut(position)?;
        item.set_content(content)?;
        Ok(&*item)
    }

    /// Changes the grid size, re-deriving the free space for the new size.
    ///
    /// A free space carries over only to odd sizes; moving to an even size
    /// turns it off.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] outside draft, [`CardError::InvalidGridSize`],
    /// or [`CardError::InvalidPosition`] naming the first item that would no
    /// longer fit.
    #[instrument(skip(self), fields(card_id = %self.id))]
    pub fn set_grid_size(&mut self, grid_size: usize) -> Result<(), CardError> {
        StructureIsMutable::check(self)?;
        let has_free_space = self.has_free_space && grid_size % 2 == 1;
        let free_space_position = free_space_for(grid_size, has_free_space)?;
        let total = grid::total_squares(grid_size);
        if let Some(p) = self
            .items
            .keys()
            .copied()
            .find(|p| *p >= total || Some(*p) == free_space_position)
        {
            return Err(CardError::InvalidPosition(p));
        }
        self.grid_size = grid_size;
        self.has_free_space = has_free_space;
        self.free_space_position = free_space_position;
        info!(grid_size, has_free_space, "Grid resized");
        Ok(())
    }

    /// Turns the free space on or off.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] outside draft,
    /// [`CardError::FreeSpaceUnavailable`] on an even grid, or
    /// [`CardError::DuplicatePosition`] if an item sits on the center.
    #[instrument(skip(self), fields(card_id = %self.id))]
    pub fn set_free_space(&mut self, enabled: bool) -> Result<(), CardError> {
        StructureIsMutable::check(self)?;
        let free_space_position = free_space_for(self.grid_size, enabled)?;
        if let Some(center) = free_space_position.filter(|c| self.is_occupied(*c)) {
            return Err(CardError::DuplicatePosition(center));
        }
        self.has_free_space = enabled;
        self.free_space_position = free_space_position;
        debug!(enabled, "Free space updated");
        Ok(())
    }

    /// Picks a uniformly random placeable square with no item.
    ///
    /// Never returns the free space or an occupied square.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFull`] when nothing is left.
    #[instrument(skip(self, rng), fields(card_id = %self.id))]
    pub fn find_random_unused_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, CardError> {
        CardHasRoom::check(self)?;
        self.unused_positions()
            .choose(rng)
            .copied()
            .ok_or(CardError::CardFull {
                capacity: self.capacity(),
            })
    }

    /// Places each content string on a random unused square.
    ///
    /// Returns the positions used, in content order. Stops at the first
    /// failure; items placed before it stay on the card.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFull`] once the card fills, plus any
    /// [`Card::add_item`] error.
    #[instrument(skip(self, contents, rng), fields(card_id = %self.id))]
    pub fn fill_random<R, I, S>(&mut self, contents: I, rng: &mut R) -> Result<Vec<usize>, CardError>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StructureIsMutable::check(self)?;
        let mut placed = Vec::new();
        for content in contents {
            let position = self.find_random_unused_position(rng)?;
            self.add_item(position, content)?;
            placed.push(position);
        }
        #[cfg(debug_assertions)]
        self.check_invariants()?;
        debug!(count = placed.len(), "Random fill complete");
        Ok(placed)
    }

    /// Randomly redistributes the existing items over the placeable squares.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] outside draft.
    #[instrument(skip(self, rng), fields(card_id = %self.id))]
    pub fn shuffle_items<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), CardError> {
        StructureIsMutable::check(self)?;
        let mut targets: Vec<usize> = (0..self.total_squares())
            .filter(|p| self.is_valid_item_position(*p))
            .collect();
        targets.shuffle(rng);
        let items = std::mem::take(&mut self.items);
        self.items = items
            .into_values()
            .zip(targets)
            .map(|(mut item, position)| {
                item.set_position(position);
                (position, item)
            })
            .collect();
        #[cfg(debug_assertions)]
        self.check_invariants()?;
        debug!(count = self.items.len(), "Items shuffled");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Completion (any state)
    // ─────────────────────────────────────────────────────────────

    /// Marks an item complete now. See [`Card::complete_item_at`].
    ///
    /// # Errors
    ///
    /// [`CardError::ItemNotFound`] if the square is empty.
    pub fn complete_item(
        &mut self,
        position: usize,
        notes: Option<String>,
        proof_reference: Option<String>,
    ) -> Result<&Item, CardError> {
        self.complete_item_at(position, Utc::now(), notes, proof_reference)
    }

    /// Marks an item complete at the given time.
    ///
    /// Idempotent: completing again keeps the original timestamp and only
    /// replaces notes or proof that are provided.
    ///
    /// # Errors
    ///
    /// [`CardError::ItemNotFound`] if the square is empty.
    #[instrument(skip(self, notes, proof_reference), fields(card_id = %self.id))]
    pub fn complete_item_at(
        &mut self,
        position: usize,
        at: DateTime<Utc>,
        notes: Option<String>,
        proof_reference: Option<String>,
    ) -> Result<&Item, CardError> {
        let item = self.item_mut(position)?;
        item.complete(at, notes, proof_reference);
        debug!(position, "Item completed");
        Ok(&*item)
    }

    /// Clears the completion flag and timestamp.
    ///
    /// # Errors
    ///
    /// [`CardError::ItemNotFound`] if the square is empty.
    #[instrument(skip(self), fields(card_id = %self.id))]
    pub fn uncomplete_item(&mut self, position: usize) -> Result<&Item, CardError> {
        let item = self.item_mut(position)?;
        item.uncomplete();
        debug!(position, "Item marked incomplete");
        Ok(&*item)
    }

    /// Replaces notes and/or proof on an item.
    ///
    /// # Errors
    ///
    /// [`CardError::ItemNotFound`] if the square is empty.
    #[instrument(skip(self, notes, proof_reference), fields(card_id = %self.id))]
    pub fn update_notes(
        &mut self,
        position: usize,
        notes: Option<String>,
        proof_reference: Option<String>,
    ) -> Result<&Item, CardError> {
        let item = self.item_mut(position)?;
        item.update_notes(notes, proof_reference);
        Ok(&*item)
    }

    // ─────────────────────────────────────────────────────────────
    //  Metadata
    // ─────────────────────────────────────────────────────────────

    /// Sets or clears the title.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title.filter(|t| !t.trim().is_empty());
    }

    /// Sets or clears the category by name.
    ///
    /// # Errors
    ///
    /// [`CardError::InvalidCategory`] for unknown names.
    pub fn set_category(&mut self, name: Option<&str>) -> Result<(), CardError> {
        self.category = name.map(Category::parse).transpose()?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Locks the layout. Requires every placeable square to be filled.
    ///
    /// # Errors
    ///
    /// [`CardError::InvalidTransition`] unless the card is a draft, and
    /// [`CardError::InsufficientItems`] if it is not full.
    #[instrument(skip(self), fields(card_id = %self.id))]
    pub fn finalize(&mut self) -> Result<(), CardError> {
        let next = self.lifecycle_state.transition(LifecycleState::Finalized)?;
        if self.items.len() != self.capacity() {
            return Err(CardError::InsufficientItems {
                placed: self.items.len(),
                capacity: self.capacity(),
            });
        }
        self.lifecycle_state = next;
        info!(items = self.items.len(), "Card finalized");
        Ok(())
    }

    /// Moves a finalized card to the archive.
    ///
    /// # Errors
    ///
    /// [`CardError::InvalidTransition`] unless the card is finalized.
    #[instrument(skip(self), fields(card_id = %self.id))]
    pub fn archive(&mut self) -> Result<(), CardError> {
        self.lifecycle_state = self.lifecycle_state.transition(LifecycleState::Archived)?;
        info!("Card archived");
        Ok(())
    }

    /// Formats the card as a text grid with a BINGO header.
    ///
    /// `[x]` completed, `[ ]` open, ` * ` free space, ` . ` empty.
    pub fn render(&self) -> String {
        let size = self.grid_size;
        let mut out = String::new();
        for letter in grid::default_header_text(size).chars() {
            out.push_str(&format!(" {} ", letter));
        }
        for row in 0..size {
            out.push('\n');
            for col in 0..size {
                let pos = row * size + col;
                let cell = match self.items.get(&pos) {
                    Some(item) if item.is_completed() => "[x]",
                    Some(_) => "[ ]",
                    None if self.is_free_space_position(pos) => " * ",
                    None => " . ",
                };
                out.push_str(cell);
            }
        }
        out
    }

    fn item_mut(&mut self, position: usize) -> Result<&mut Item, CardError> {
        self.items
            .get_mut(&position)
            .ok_or(CardError::ItemNotFound(position))
    }

    pub(crate) fn items_map(&self) -> &BTreeMap<usize, Item> {
        &self.items
    }

    /// Runs the card invariant set, joining every violation into one error.
    pub(crate) fn check_invariants(&self) -> Result<(), CardError> {
        CardInvariants::check_all(self).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            CardError::InvariantViolation(descriptions)
        })
    }

    /// Direct item access, bypassing every placement rule.
    #[cfg(test)]
    pub(crate) fn items_map_mut(&mut self) -> &mut BTreeMap<usize, Item> {
        &mut self.items
    }

    /// Moves an item without any checks.
    #[cfg(test)]
    pub(crate) fn force_move(&mut self, from: usize, to: usize) {
        if let Some(mut item) = self.items.remove(&from) {
            item.set_position(to);
            self.items.insert(to, item);
        }
    }

    /// Sets the free space without any checks.
    #[cfg(test)]
    pub(crate) fn force_free_space(&mut self, position: Option<usize>) {
        self.has_free_space = position.is_some();
        self.free_space_position = position;
    }
}

fn free_space_for(grid_size: usize, has_free_space: bool) -> Result<Option<usize>, CardError> {
    if !grid::is_valid_grid_size(grid_size) {
        return Err(CardError::InvalidGridSize(grid_size));
    }
    match (has_free_space, grid_size % 2 == 1) {
        (false, _) => Ok(None),
        (true, true) => Ok(Some(grid::default_free_space_position(grid_size))),
        (true, false) => Err(CardError::FreeSpaceUnavailable(grid_size)),
    }
}

/// Serializes the item map as a flat list ordered by position.
mod item_list {
    use super::Item;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(items: &BTreeMap<usize, Item>, s: S) -> Result<S::Ok, S::Error> {
        let list: Vec<&Item> = items.values().collect();
        list.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<usize, Item>, D::Error> {
        let list = Vec::<Item>::deserialize(d)?;
        let mut items = BTreeMap::new();
        for item in list {
            let position = item.position();
            if items.insert(position, item).is_some() {
                return Err(D::Error::custom(format!("duplicate item at position {}", position)));
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn full_card() -> Card {
        let mut card = Card::new(2025);
        for p in card.unused_positions() {
            card.add_item(p, format!("Goal {}", p)).unwrap();
        }
        card
    }

    #[test]
    fn test_standard_capacity() {
        let card = Card::new(2025);
        assert_eq!(card.capacity(), 24);
        assert!(!card.is_valid_item_position(12));
        assert!(card.is_free_space_position(12));

        let card = Card::with_grid(2025, 5, false).unwrap();
        assert_eq!(card.capacity(), 25);
        assert!(card.is_valid_item_position(12));
        assert_eq!(card.free_space_position(), None);
    }

    #[test]
    fn test_with_grid_validation() {
        assert_eq!(Card::with_grid(2025, 6, false).unwrap_err(), CardError::InvalidGridSize(6));
        assert_eq!(
            Card::with_grid(2025, 4, true).unwrap_err(),
            CardError::FreeSpaceUnavailable(4)
        );
        let card = Card::with_grid(2025, 3, true).unwrap();
        assert_eq!(card.free_space_position(), Some(4));
        assert_eq!(card.capacity(), 8);
    }

    #[test]
    fn test_add_item_errors() {
        let mut card = Card::new(2025);
        assert_eq!(card.add_item(12, "x").unwrap_err(), CardError::InvalidPosition(12));
        assert_eq!(card.add_item(25, "x").unwrap_err(), CardError::InvalidPosition(25));
        card.add_item(0, "Run").unwrap();
        assert_eq!(card.add_item(0, "Swim").unwrap_err(), CardError::DuplicatePosition(0));
        assert_eq!(card.add_item(1, "  ").unwrap_err(), CardError::EmptyContent);
        assert_eq!(card.item_count(), 1);
    }

    #[test]
    fn test_add_item_beyond_capacity() {
        let mut card = full_card();
        assert_eq!(card.add_item(0, "One more").unwrap_err(), CardError::CardFull { capacity: 24 });
    }

    #[test]
    fn test_finalize_locks_structure() {
        let mut card = Card::new(2025);
        card.add_item(0, "Run").unwrap();
        assert_eq!(
            card.finalize().unwrap_err(),
            CardError::InsufficientItems {
                placed: 1,
                capacity: 24
            }
        );

        let mut card = full_card();
        card.finalize().unwrap();
        assert_eq!(card.lifecycle_state(), LifecycleState::Finalized);
        assert_eq!(
            card.add_item(0, "x").unwrap_err(),
            CardError::CardFinalized(LifecycleState::Finalized)
        );
        assert!(matches!(card.remove_item(0), Err(CardError::CardFinalized(_))));
        assert!(matches!(card.set_free_space(false), Err(CardError::CardFinalized(_))));
        assert!(matches!(card.set_grid_size(3), Err(CardError::CardFinalized(_))));
        assert!(card.complete_item(0, None, None).is_ok());
    }

    #[test]
    fn test_archive_requires_finalized() {
        let mut card = Card::new(2025);
        assert!(matches!(card.archive(), Err(CardError::InvalidTransition { .. })));
        let mut card = full_card();
        card.finalize().unwrap();
        card.archive().unwrap();
        assert_eq!(card.lifecycle_state(), LifecycleState::Archived);
        assert!(card.uncomplete_item(3).is_ok());
        assert!(matches!(card.finalize(), Err(CardError::InvalidTransition { .. })));
    }

    #[test]
    fn test_complete_missing_item() {
        let mut card = Card::new(2025);
        assert_eq!(card.complete_item(4, None, None).unwrap_err(), CardError::ItemNotFound(4));
    }

    #[test]
    fn test_display_name() {
        let mut card = Card::new(2026);
        assert_eq!(card.display_name(), "2026 Bingo Card");
        card.set_title(Some("Big Year".into()));
        assert_eq!(card.display_name(), "Big Year");
        card.set_title(Some("   ".into()));
        assert_eq!(card.display_name(), "2026 Bingo Card");
    }

    #[test]
    fn test_set_category() {
        let mut card = Card::new(2025);
        card.set_category(Some("career")).unwrap();
        assert_eq!(card.category(), Some(Category::Career));
        assert!(matches!(card.set_category(Some("nope")), Err(CardError::InvalidCategory(_))));
        assert_eq!(card.category(), Some(Category::Career));
        card.set_category(None).unwrap();
        assert_eq!(card.category(), None);
    }

    #[test]
    fn test_set_grid_size_rederives_free_space() {
        let mut card = Card::new(2025);
        card.add_item(0, "a").unwrap();
        card.set_grid_size(3).unwrap();
        assert_eq!(card.free_space_position(), Some(4));
        card.set_grid_size(4).unwrap();
        assert!(!card.has_free_space());
        assert_eq!(card.capacity(), 16);

        card.add_item(15, "b").unwrap();
        assert_eq!(card.set_grid_size(3).unwrap_err(), CardError::InvalidPosition(15));
        assert_eq!(card.grid_size(), 4);
    }

    #[test]
    fn test_enable_free_space_over_item() {
        let mut card = Card::with_grid(2025, 5, false).unwrap();
        card.add_item(12, "center").unwrap();
        assert_eq!(card.set_free_space(true).unwrap_err(), CardError::DuplicatePosition(12));
        card.remove_item(12).unwrap();
        card.set_free_space(true).unwrap();
        assert_eq!(card.capacity(), 24);
    }

    #[test]
    fn test_shuffle_keeps_items_off_free_space() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut card = Card::new(2025);
        card.fill_random((0..10).map(|i| format!("Goal {}", i)), &mut rng).unwrap();
        card.shuffle_items(&mut rng).unwrap();
        assert_eq!(card.item_count(), 10);
        assert!(card.items().all(|i| card.is_valid_item_position(i.position())));
        assert!(card.items_map().iter().all(|(p, i)| *p == i.position()));
    }

    #[test]
    fn test_render_marks_cells() {
        let mut card = Card::with_grid(2025, 3, true).unwrap();
        card.add_item(0, "a").unwrap();
        card.add_item(1, "b").unwrap();
        card.complete_item(0, None, None).unwrap();
        assert_eq!(card.render(), " B  I  N \n[x][ ] . \n .  *  . \n .  .  . ");
    }

    #[test]
    fn test_json_items_are_a_list() {
        let mut card = Card::new(2025);
        card.add_item(3, "Three").unwrap();
        card.add_item(1, "One").unwrap();
        let json = serde_json::to_value(&card).unwrap();
        let positions: Vec<_> = json["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["position"].as_u64().unwrap())
            .collect();
        assert_eq!(positions, vec![1, 3]);
        assert_eq!(json["lifecycle_state"], "draft");

        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }

    fn reject(json: serde_json::Value) -> String {
        serde_json::from_value::<Card>(json).unwrap_err().to_string()
    }

    #[test]
    fn test_deserialize_rejects_items_off_the_grid_or_on_free_space() {
        let mut card = Card::new(2025);
        card.add_item(0, "Run").unwrap();
        card.add_item(1, "Swim").unwrap();
        let mut json = serde_json::to_value(&card).unwrap();
        json["items"][0]["position"] = serde_json::json!(12);
        json["items"][1]["position"] = serde_json::json!(99);
        assert!(reject(json).contains("Invariant violation"));
    }

    #[test]
    fn test_deserialize_rejects_bad_grid_configuration() {
        let card = Card::new(2025);

        let mut json = serde_json::to_value(&card).unwrap();
        json["grid_size"] = serde_json::json!(1u64 << 33);
        assert!(reject(json).contains("Grid size"));

        let mut json = serde_json::to_value(&card).unwrap();
        json["grid_size"] = serde_json::json!(4);
        assert!(!reject(json).is_empty());

        let mut json = serde_json::to_value(&card).unwrap();
        json["free_space_position"] = serde_json::json!(0);
        assert!(reject(json).contains("free space"));
    }

    #[test]
    fn test_deserialize_rejects_completion_without_timestamp() {
        let mut card = Card::new(2025);
        card.add_item(3, "Read").unwrap();
        let mut json = serde_json::to_value(&card).unwrap();
        json["items"][0]["is_completed"] = serde_json::json!(true);
        assert!(reject(json).contains("completion time"));
    }

    #[test]
    fn test_deserialize_rejects_locked_card_that_is_not_full() {
        let card = full_card();
        let mut json = serde_json::to_value(&card).unwrap();
        json["lifecycle_state"] = serde_json::json!("finalized");
        json["items"].as_array_mut().unwrap().pop();
        assert!(!reject(json).is_empty());

        let mut json = serde_json::to_value(&card).unwrap();
        json["lifecycle_state"] = serde_json::json!("finalized");
        assert!(serde_json::from_value::<Card>(json).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_blank_content() {
        let mut card = Card::new(2025);
        card.add_item(3, "Read").unwrap();
        let mut json = serde_json::to_value(&card).unwrap();
        json["items"][0]["content"] = serde_json::json!("   ");
        assert!(reject(json).contains("no content"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_bulk_moves_check_invariants() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut card = Card::with_grid(2025, 3, true).unwrap();
        card.items_map_mut()
            .insert(0, Item::with_inconsistent_completion(0, "Broken"));

        assert!(matches!(
            card.shuffle_items(&mut rng),
            Err(CardError::InvariantViolation(_))
        ));
        assert!(matches!(
            card.fill_random(["Goal"], &mut rng),
            Err(CardError::InvariantViolation(_))
        ));
    }
}
