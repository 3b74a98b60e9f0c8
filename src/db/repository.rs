//! Card repositories.

use async_trait::async_trait;
use bingo_card::{Card, CardId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::db::RepositoryError;

/// Storage for cards, keyed by [`CardId`].
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Loads a card.
    ///
    /// # Errors
    ///
    /// A not-found [`RepositoryError`] when no card has this id.
    async fn load(&self, id: CardId) -> Result<Card, RepositoryError>;

    /// Inserts or replaces a card.
    async fn save(&self, card: &Card) -> Result<(), RepositoryError>;

    /// All stored cards, newest year first.
    async fn list(&self) -> Result<Vec<Card>, RepositoryError>;
}

fn sort_cards(cards: &mut [Card]) {
    cards.sort_by(|a, b| b.year().cmp(&a.year()).then_with(|| a.id().cmp(&b.id())));
}

/// Cards held in memory; lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryCardRepository {
    cards: RwLock<HashMap<CardId, Card>>,
}

impl InMemoryCardRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    #[instrument(skip(self))]
    async fn load(&self, id: CardId) -> Result<Card, RepositoryError> {
        self.cards
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(id))
    }

    #[instrument(skip(self, card), fields(card_id = %card.id()))]
    async fn save(&self, card: &Card) -> Result<(), RepositoryError> {
        self.cards.write().await.insert(card.id(), card.clone());
        debug!("Card saved in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Card>, RepositoryError> {
        let mut cards: Vec<Card> = self.cards.read().await.values().cloned().collect();
        sort_cards(&mut cards);
        Ok(cards)
    }
}

/// One pretty-printed JSON file per card: `<dir>/<id>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileCardRepository {
    dir: PathBuf,
}

impl JsonFileCardRepository {
    /// Opens a repository rooted at `dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the directory cannot be created.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        info!("Card repository ready");
        Ok(Self { dir })
    }

    /// Directory holding the card files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: CardId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl CardRepository for JsonFileCardRepository {
    #[instrument(skip(self))]
    async fn load(&self, id: CardId) -> Result<Card, RepositoryError> {
        let path = self.path_for(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::not_found(id));
            }
            Err(e) => return Err(e.into()),
        };
        let card: Card = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), "Card loaded");
        Ok(card)
    }

    #[instrument(skip(self, card), fields(card_id = %card.id()))]
    async fn save(&self, card: &Card) -> Result<(), RepositoryError> {
        let path = self.path_for(card.id());
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(card)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "Card saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Card>, RepositoryError> {
        let mut cards = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Card>(&bytes) {
                Ok(card) => cards.push(card),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable card file"),
            }
        }
        sort_cards(&mut cards);
        debug!(count = cards.len(), "Cards listed");
        Ok(cards)
    }
}
