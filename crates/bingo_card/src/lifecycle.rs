//! Card lifecycle: draft, finalized, archived.
//!
//! The lifecycle only ever moves forward. A draft is freely editable; a
//! finalized card has a locked layout; an archived card is a finalized card
//! hidden from the current-year views.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CardError;

/// Where a card is in its lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    /// Items may be added, moved, and removed.
    #[default]
    Draft,
    /// Layout is locked; only completion state changes.
    Finalized,
    /// Finalized card kept for past-year views.
    Archived,
}

impl LifecycleState {
    /// True iff items and free-space settings may still change.
    pub fn is_structurally_mutable(self) -> bool {
        matches!(self, LifecycleState::Draft)
    }

    /// True iff `next` is the single legal successor of this state.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        matches!(
            (self, next),
            (LifecycleState::Draft, LifecycleState::Finalized)
                | (LifecycleState::Finalized, LifecycleState::Archived)
        )
    }

    /// Checks and returns the next state.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidTransition`] for anything but
    /// draft to finalized or finalized to archived.
    #[instrument]
    pub fn transition(self, next: LifecycleState) -> Result<LifecycleState, CardError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CardError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Fails with [`CardError::CardFinalized`] unless the state is draft.
    pub fn require_mutable(self) -> Result<(), CardError> {
        if self.is_structurally_mutable() {
            Ok(())
        } else {
            Err(CardError::CardFinalized(self))
        }
    }
}
