//! First-class card actions.
//!
//! Actions are the request-shaped form of every card mutation. They can be
//! validated before application, serialized, and logged.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::card::Card;
use crate::contracts::{ActionContract, Contract};
use crate::error::CardError;

/// A mutation of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CardAction {
    /// Place a new item; a missing position means a random unused square.
    AddItem {
        /// Target square.
        #[serde(default)]
        position: Option<usize>,
        /// Goal text.
        content: String,
    },
    /// Remove an item (draft only).
    RemoveItem {
        /// Square to clear.
        position: usize,
    },
    /// Replace an item's text (draft only).
    UpdateContent {
        /// Square to edit.
        position: usize,
        /// New goal text.
        content: String,
    },
    /// Mark an item complete.
    CompleteItem {
        /// Square to complete.
        position: usize,
        /// Optional notes.
        #[serde(default)]
        notes: Option<String>,
        /// Optional proof link.
        #[serde(default)]
        proof_reference: Option<String>,
    },
    /// Mark an item incomplete.
    UncompleteItem {
        /// Square to reopen.
        position: usize,
    },
    /// Replace notes and/or proof.
    UpdateNotes {
        /// Square to annotate.
        position: usize,
        /// Optional notes.
        #[serde(default)]
        notes: Option<String>,
        /// Optional proof link.
        #[serde(default)]
        proof_reference: Option<String>,
    },
    /// Set or clear the title.
    SetTitle {
        /// New title.
        title: Option<String>,
    },
    /// Set or clear the category by name.
    SetCategory {
        /// Category name.
        category: Option<String>,
    },
    /// Resize the grid (draft only).
    SetGridSize {
        /// New side length.
        size: usize,
    },
    /// Turn the free space on or off (draft only).
    SetFreeSpace {
        /// Whether the card has a free space.
        enabled: bool,
    },
    /// Lock the layout.
    Finalize,
    /// Move to the archive.
    Archive,
}

impl std::fmt::Display for CardAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardAction::AddItem {
                position: Some(p), ..
            } => write!(f, "add item at {}", p),
            CardAction::AddItem { position: None, .. } => write!(f, "add item at random"),
            CardAction::RemoveItem { position } => write!(f, "remove item at {}", position),
            CardAction::UpdateContent { position, .. } => write!(f, "edit item at {}", position),
            CardAction::CompleteItem { position, .. } => write!(f, "complete item at {}", position),
            CardAction::UncompleteItem { position } => write!(f, "reopen item at {}", position),
            CardAction::UpdateNotes { position, .. } => write!(f, "annotate item at {}", position),
            CardAction::SetTitle { .. } => write!(f, "set title"),
            CardAction::SetCategory { .. } => write!(f, "set category"),
            CardAction::SetGridSize { size } => write!(f, "resize to {}x{}", size, size),
            CardAction::SetFreeSpace { enabled } => write!(f, "set free space {}", enabled),
            CardAction::Finalize => write!(f, "finalize"),
            CardAction::Archive => write!(f, "archive"),
        }
    }
}

impl Card {
    /// Applies an action under the action contract.
    ///
    /// Preconditions are always checked; postconditions only in debug
    /// builds. `rng` is used only by random placement.
    ///
    /// # Errors
    ///
    /// Any [`CardError`] the corresponding card operation can return.
    #[instrument(skip(self, action, rng), fields(card_id = %self.id(), action = %action))]
    pub fn apply<R: Rng + ?Sized>(&mut self, action: CardAction, rng: &mut R) -> Result<(), CardError> {
        #[cfg(debug_assertions)]
        let before = self.clone();

        ActionContract::pre(self, &action)?;

        match action {
            CardAction::AddItem { position, content } => {
                let position = match position {
                    Some(p) => p,
                    None => self.find_random_unused_position(rng)?,
                };
                self.add_item(position, content)?;
            }
            CardAction::RemoveItem { position } => {
                self.remove_item(position)?;
            }
            CardAction::UpdateContent { position, content } => {
                self.update_item_content(position, content)?;
            }
            CardAction::CompleteItem {
                position,
                notes,
                proof_reference,
            } => {
                self.complete_item_at(position, Utc::now(), notes, proof_reference)?;
            }
            CardAction::UncompleteItem { position } => {
                self.uncomplete_item(position)?;
            }
            CardAction::UpdateNotes {
                position,
                notes,
                proof_reference,
            } => {
                self.update_notes(position, notes, proof_reference)?;
            }
            CardAction::SetTitle { title } => self.set_title(title),
            CardAction::SetCategory { category } => self.set_category(category.as_deref())?,
            CardAction::SetGridSize { size } => self.set_grid_size(size)?,
            CardAction::SetFreeSpace { enabled } => self.set_free_space(enabled)?,
            CardAction::Finalize => self.finalize()?,
            CardAction::Archive => self.archive()?,
        }

        #[cfg(debug_assertions)]
        ActionContract::post(&before, self)?;

        debug!("Action applied");
        Ok(())
    }
}
