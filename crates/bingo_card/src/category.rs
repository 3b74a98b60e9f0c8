//! Curated goal categories.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CardError;

/// One of the fixed card categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Category {
    /// Fitness, sleep, nutrition.
    Health,
    /// Work and professional growth.
    Career,
    /// Saving, budgeting, investing.
    Finance,
    /// Family, friends, partners.
    Relationships,
    /// Courses, books, skills.
    Learning,
    /// Trips and new places.
    Travel,
    /// Making things.
    Creativity,
    /// Everything else that is just for you.
    Personal,
}

impl Category {
    /// Parses a category name.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidCategory`] for names outside the curated set.
    pub fn parse(name: &str) -> Result<Self, CardError> {
        Category::from_str(name.trim()).map_err(|_| CardError::InvalidCategory(name.to_string()))
    }
}

/// True iff `name` is one of the curated categories.
pub fn is_valid_category(name: &str) -> bool {
    Category::parse(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_eight_curated_categories() {
        assert_eq!(Category::iter().count(), 8);
        for c in Category::iter() {
            assert!(is_valid_category(c.as_ref()));
        }
    }

    #[test]
    fn test_category_lookup_is_case_insensitive() {
        assert_eq!(Category::parse("Health"), Ok(Category::Health));
        assert_eq!(Category::parse("  travel "), Ok(Category::Travel));
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!(!is_valid_category("gardening"));
        assert_eq!(
            Category::parse("gardening"),
            Err(CardError::InvalidCategory("gardening".to_string()))
        );
    }
}
