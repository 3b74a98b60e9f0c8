//! A single goal placed on a card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CardError;

/// One goal occupying one grid position.
///
/// `completed_at` is set exactly when `is_completed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    position: usize,
    content: String,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    proof_reference: Option<String>,
}

impl Item {
    /// Creates an incomplete item.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::EmptyContent`] if the content is blank.
    pub fn new(position: usize, content: impl Into<String>) -> Result<Self, CardError> {
        Ok(Self {
            position,
            content: normalize_content(content)?,
            is_completed: false,
            completed_at: None,
            notes: None,
            proof_reference: None,
        })
    }

    /// Builds an item with a completion flag that may contradict its timestamp.
    #[cfg(test)]
    pub(crate) fn with_inconsistent_completion(position: usize, content: &str) -> Self {
        Self {
            position,
            content: content.to_string(),
            is_completed: true,
            completed_at: None,
            notes: None,
            proof_reference: None,
        }
    }

    /// Grid position, 0-indexed row-major.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Goal text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the goal is done.
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// When the goal was first completed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Free-form notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Link or reference to proof of completion.
    pub fn proof_reference(&self) -> Option<&str> {
        self.proof_reference.as_deref()
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub(crate) fn set_content(&mut self, content: impl Into<String>) -> Result<(), CardError> {
        self.content = normalize_content(content)?;
        Ok(())
    }

    /// Marks complete. The first completion timestamp sticks; notes and
    /// proof are replaced only when provided.
    pub(crate) fn complete(
        &mut self,
        at: DateTime<Utc>,
        notes: Option<String>,
        proof_reference: Option<String>,
    ) {
        if !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(at);
        }
        self.update_notes(notes, proof_reference);
    }

    pub(crate) fn uncomplete(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }

    pub(crate) fn update_notes(&mut self, notes: Option<String>, proof_reference: Option<String>) {
        if notes.is_some() {
            self.notes = notes;
        }
        if proof_reference.is_some() {
            self.proof_reference = proof_reference;
        }
    }
}

fn normalize_content(content: impl Into<String>) -> Result<String, CardError> {
    let content = content.into();
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CardError::EmptyContent);
    }
    Ok(trimmed.to_string())
}
