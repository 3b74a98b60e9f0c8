//! Contract-based validation for card actions.
//!
//! Preconditions are small named checks composed per action. The action
//! contract adds postconditions that compare the card before and after.

use tracing::{instrument, warn};

use crate::action::CardAction;
use crate::card::Card;
use crate::error::CardError;
use crate::lifecycle::LifecycleState;

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), CardError>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), CardError>;
}

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the card is still a draft.
pub struct StructureIsMutable;

impl StructureIsMutable {
    /// Fails with [`CardError::CardFinalized`] outside draft.
    pub fn check(card: &Card) -> Result<(), CardError> {
        card.lifecycle_state().require_mutable()
    }
}

/// Precondition: the position is on the grid and not the free space.
pub struct PositionIsPlaceable;

impl PositionIsPlaceable {
    /// Fails with [`CardError::InvalidPosition`].
    pub fn check(card: &Card, position: usize) -> Result<(), CardError> {
        if card.is_valid_item_position(position) {
            Ok(())
        } else {
            Err(CardError::InvalidPosition(position))
        }
    }
}

/// Precondition: at least one placeable square is empty.
pub struct CardHasRoom;

impl CardHasRoom {
    /// Fails with [`CardError::CardFull`].
    pub fn check(card: &Card) -> Result<(), CardError> {
        if card.is_full() {
            Err(CardError::CardFull {
                capacity: card.capacity(),
            })
        } else {
            Ok(())
        }
    }
}

/// Precondition: no item sits at the position.
pub struct PositionIsVacant;

impl PositionIsVacant {
    /// Fails with [`CardError::DuplicatePosition`].
    pub fn check(card: &Card, position: usize) -> Result<(), CardError> {
        if card.is_occupied(position) {
            Err(CardError::DuplicatePosition(position))
        } else {
            Ok(())
        }
    }
}

/// Precondition: an item sits at the position.
pub struct ItemExists;

impl ItemExists {
    /// Fails with [`CardError::ItemNotFound`].
    pub fn check(card: &Card, position: usize) -> Result<(), CardError> {
        if card.is_occupied(position) {
            Ok(())
        } else {
            Err(CardError::ItemNotFound(position))
        }
    }
}

/// Composite precondition for placing an item.
///
/// Checked in order: lifecycle, position, room, vacancy.
pub struct PlaceItem;

impl PlaceItem {
    /// Validates all preconditions for placing an item at `position`.
    #[instrument(skip(card))]
    pub fn check(card: &Card, position: usize) -> Result<(), CardError> {
        StructureIsMutable::check(card)?;
        PositionIsPlaceable::check(card, position)?;
        CardHasRoom::check(card)?;
        PositionIsVacant::check(card, position)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Action Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for [`CardAction`]s.
///
/// Postconditions:
/// - Card invariants hold
/// - A card that was not a draft kept its item positions
pub struct ActionContract;

impl Contract<Card, CardAction> for ActionContract {
    fn pre(card: &Card, action: &CardAction) -> Result<(), CardError> {
        match action {
            CardAction::AddItem {
                position: Some(position),
                ..
            } => PlaceItem::check(card, *position),
            CardAction::AddItem { position: None, .. } => {
                StructureIsMutable::check(card)?;
                CardHasRoom::check(card)
            }
            CardAction::RemoveItem { position } | CardAction::UpdateContent { position, .. } => {
                StructureIsMutable::check(card)?;
                ItemExists::check(card, *position)
            }
            CardAction::CompleteItem { position, .. }
            | CardAction::UncompleteItem { position }
            | CardAction::UpdateNotes { position, .. } => ItemExists::check(card, *position),
            CardAction::SetGridSize { .. } | CardAction::SetFreeSpace { .. } => {
                StructureIsMutable::check(card)
            }
            CardAction::SetTitle { .. } | CardAction::SetCategory { .. } => Ok(()),
            CardAction::Finalize => card
                .lifecycle_state()
                .transition(LifecycleState::Finalized)
                .map(|_| ()),
            CardAction::Archive => card
                .lifecycle_state()
                .transition(LifecycleState::Archived)
                .map(|_| ()),
        }
    }

    fn post(before: &Card, after: &Card) -> Result<(), CardError> {
        after.check_invariants().map_err(|e| match e {
            CardError::InvariantViolation(d) => CardError::InvariantViolation(format!("Postcondition failed: {}", d)),
            other => other,
        })?;

        if !before.lifecycle_state().is_structurally_mutable() {
            let before_positions = before.items().map(|i| i.position());
            let after_positions = after.items().map(|i| i.position());
            if !before_positions.eq(after_positions) {
                warn!(card_id = %after.id(), "Layout changed on a locked card");
                return Err(CardError::InvariantViolation(
                    "Postcondition failed: locked card layout changed".to_string(),
                ));
            }
        }
        Ok(())
    }
}
