//! Card service: load, mutate, persist, and report.

use bingo_card::{Card, CardAction, CardError, CardId, CardStats, Line, completed_lines, compute_stats};
use derive_getters::Getters;
use derive_more::{Display, Error, From};
use derive_new::new;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::{info, instrument};

use crate::db::{CardRepository, RepositoryError};

/// Failure from a service call.
#[derive(Debug, Display, Error, From)]
pub enum ServiceError {
    /// A card rule rejected the request.
    #[display("{_0}")]
    Card(CardError),
    /// The repository failed.
    #[display("{_0}")]
    Repository(RepositoryError),
}

impl ServiceError {
    /// True when the card does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Repository(e) if e.is_not_found())
    }
}

/// Parameters for a new card.
#[derive(Debug, Clone, new)]
pub struct NewCard {
    /// Calendar year.
    pub year: i32,
    /// Side length.
    #[new(value = "5")]
    pub grid_size: usize,
    /// Whether the centre square is free.
    #[new(value = "true")]
    pub has_free_space: bool,
    /// Optional title.
    #[new(default)]
    pub title: Option<String>,
    /// Optional category name.
    #[new(default)]
    pub category: Option<String>,
}

/// A card with everything derived from it.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct CardView {
    card: Card,
    stats: CardStats,
    completed_lines: Vec<Line>,
    display_name: String,
}

impl From<Card> for CardView {
    fn from(card: Card) -> Self {
        Self {
            stats: compute_stats(&card),
            completed_lines: completed_lines(&card),
            display_name: card.display_name(),
            card,
        }
    }
}

/// Runs card operations against a repository.
///
/// Each mutating call is load, apply, save. Concurrent calls on the same
/// card are last-writer-wins.
#[derive(Debug)]
pub struct CardService<R> {
    repo: R,
    rng: Mutex<StdRng>,
}

impl<R: CardRepository> CardService<R> {
    /// Creates a service with an entropy-seeded RNG.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a service with a fixed RNG seed.
    pub fn with_seed(repo: R, seed: u64) -> Self {
        Self {
            repo,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates and stores an empty draft card.
    ///
    /// # Errors
    ///
    /// Grid, free-space, or category errors, or a storage failure.
    #[instrument(skip(self, request), fields(year = request.year, size = request.grid_size))]
    pub async fn create_card(&self, request: NewCard) -> Result<CardView, ServiceError> {
        let mut card = Card::with_grid(request.year, request.grid_size, request.has_free_space)?;
        card.set_title(request.title);
        card.set_category(request.category.as_deref())?;
        self.repo.save(&card).await?;
        info!(card_id = %card.id(), "Card created");
        Ok(card.into())
    }

    /// Applies an action to a stored card and saves it.
    ///
    /// Nothing is saved when the action is rejected.
    ///
    /// # Errors
    ///
    /// Not-found, any [`CardError`] from the action, or a storage failure.
    #[instrument(skip(self, action), fields(action = %action))]
    pub async fn apply(&self, id: CardId, action: CardAction) -> Result<CardView, ServiceError> {
        let mut card = self.repo.load(id).await?;
        {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            card.apply(action, &mut *rng)?;
        }
        self.repo.save(&card).await?;
        Ok(card.into())
    }

    /// Places each content at a random unused square.
    ///
    /// All or nothing: if the card fills up part way, nothing is saved.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFull`], [`CardError::CardFinalized`], or repository errors.
    #[instrument(skip(self, contents))]
    pub async fn fill_random(&self, id: CardId, contents: Vec<String>) -> Result<CardView, ServiceError> {
        let mut card = self.repo.load(id).await?;
        let placed = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            card.fill_random(contents, &mut *rng)?
        };
        self.repo.save(&card).await?;
        info!(placed = placed.len(), "Items placed at random");
        Ok(card.into())
    }

    /// Redistributes a draft card's items at random.
    ///
    /// # Errors
    ///
    /// [`CardError::CardFinalized`] or repository errors.
    #[instrument(skip(self))]
    pub async fn shuffle(&self, id: CardId) -> Result<CardView, ServiceError> {
        let mut card = self.repo.load(id).await?;
        {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            card.shuffle_items(&mut *rng)?;
        }
        self.repo.save(&card).await?;
        Ok(card.into())
    }

    /// Loads a card with its derived data.
    ///
    /// # Errors
    ///
    /// Repository errors.
    #[instrument(skip(self))]
    pub async fn get(&self, id: CardId) -> Result<CardView, ServiceError> {
        Ok(self.repo.load(id).await?.into())
    }

    /// Progress statistics for a card.
    ///
    /// # Errors
    ///
    /// Repository errors.
    #[instrument(skip(self))]
    pub async fn stats(&self, id: CardId) -> Result<CardStats, ServiceError> {
        let card = self.repo.load(id).await?;
        Ok(compute_stats(&card))
    }

    /// Every stored card, newest year first.
    ///
    /// # Errors
    ///
    /// Repository errors.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CardView>, ServiceError> {
        let cards = self.repo.list().await?;
        Ok(cards.into_iter().map(CardView::from).collect())
    }
}
