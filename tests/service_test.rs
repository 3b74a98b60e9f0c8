//! Tests for the card service over both repositories.

use bingo_card::{CardAction, CardError, CardId, LifecycleState};
use tempfile::TempDir;

use yearly_bingo::{
    CardRepository, CardService, InMemoryCardRepository, JsonFileCardRepository, NewCard, ServiceError,
};

fn add(position: usize, content: &str) -> CardAction {
    CardAction::AddItem {
        position: Some(position),
        content: content.to_string(),
    }
}

fn complete(position: usize) -> CardAction {
    CardAction::CompleteItem {
        position,
        notes: None,
        proof_reference: None,
    }
}

#[tokio::test]
async fn test_create_and_play_three_by_three() {
    let service = CardService::with_seed(InMemoryCardRepository::new(), 7);
    let mut request = NewCard::new(2025);
    request.grid_size = 3;
    request.title = Some("Small wins".to_string());
    let view = service.create_card(request).await.expect("create failed");
    let id = view.card().id();
    assert_eq!(view.display_name(), "Small wins");
    assert_eq!(view.card().capacity(), 8);

    let goals: Vec<String> = (0..8).map(|i| format!("Goal {}", i)).collect();
    let view = service.fill_random(id, goals).await.expect("fill failed");
    assert!(view.card().is_full());

    service.apply(id, CardAction::Finalize).await.expect("finalize failed");
    for position in [0, 8] {
        service.apply(id, complete(position)).await.expect("complete failed");
    }
    let view = service.get(id).await.expect("get failed");
    assert_eq!(*view.stats().bingos_achieved(), 1);
    assert_eq!(view.completed_lines().len(), 1);
    assert_eq!(view.card().lifecycle_state(), LifecycleState::Finalized);
}

#[tokio::test]
async fn test_rejected_action_is_not_saved() {
    let service = CardService::new(InMemoryCardRepository::new());
    let id = service.create_card(NewCard::new(2025)).await.unwrap().card().id();
    service.apply(id, add(0, "Read 12 books")).await.unwrap();

    let err = service.apply(id, add(0, "Learn piano")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Card(CardError::DuplicatePosition(0))));

    let stored = service.repository().load(id).await.unwrap();
    assert_eq!(stored.item(0).map(|i| i.content()), Some("Read 12 books"));
}

#[tokio::test]
async fn test_fill_past_capacity_saves_nothing() {
    let service = CardService::with_seed(InMemoryCardRepository::new(), 1);
    let mut request = NewCard::new(2025);
    request.grid_size = 2;
    request.has_free_space = false;
    let id = service.create_card(request).await.unwrap().card().id();

    let goals: Vec<String> = (0..5).map(|i| i.to_string()).collect();
    let err = service.fill_random(id, goals).await.unwrap_err();
    assert!(matches!(err, ServiceError::Card(CardError::CardFull { capacity: 4 })));
    assert_eq!(service.stats(id).await.unwrap().total_items(), &0);
}

#[tokio::test]
async fn test_unknown_card_is_not_found() {
    let service = CardService::new(InMemoryCardRepository::new());
    let err = service.get(CardId::new()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_invalid_creation_requests() {
    let service = CardService::new(InMemoryCardRepository::new());
    let mut request = NewCard::new(2025);
    request.grid_size = 6;
    assert!(matches!(
        service.create_card(request).await,
        Err(ServiceError::Card(CardError::InvalidGridSize(6)))
    ));

    let mut request = NewCard::new(2025);
    request.category = Some("astrology".to_string());
    assert!(matches!(
        service.create_card(request).await,
        Err(ServiceError::Card(CardError::InvalidCategory(_)))
    ));
    assert!(service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_json_repository_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let repo = JsonFileCardRepository::open(dir.path().join("cards")).await.expect("open failed");
    let service = CardService::with_seed(repo, 3);

    let older = service.create_card(NewCard::new(2024)).await.unwrap().card().id();
    let newer = service.create_card(NewCard::new(2025)).await.unwrap().card().id();
    service.apply(newer, add(3, "Visit Lisbon")).await.unwrap();
    service.apply(newer, complete(3)).await.unwrap();

    // A fresh repository over the same directory sees the same cards.
    let reopened = JsonFileCardRepository::open(dir.path().join("cards")).await.unwrap();
    let card = reopened.load(newer).await.unwrap();
    assert!(card.item(3).is_some_and(|i| i.is_completed()));

    let listed: Vec<CardId> = reopened.list().await.unwrap().iter().map(|c| c.id()).collect();
    assert_eq!(listed, vec![newer, older]);

    let missing = reopened.load(CardId::new()).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_json_repository_skips_foreign_files() {
    let dir = TempDir::new().expect("temp dir");
    let repo = JsonFileCardRepository::open(dir.path()).await.unwrap();
    tokio::fs::write(dir.path().join("notes.txt"), "not a card").await.unwrap();
    tokio::fs::write(dir.path().join("broken.json"), "{").await.unwrap();
    let card = bingo_card::Card::new(2025);
    repo.save(&card).await.unwrap();

    let cards = repo.list().await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id(), card.id());
}

#[tokio::test]
async fn test_json_repository_rejects_corrupted_card() {
    let dir = TempDir::new().expect("temp dir");
    let repo = JsonFileCardRepository::open(dir.path()).await.unwrap();
    let mut card = bingo_card::Card::new(2025);
    card.add_item(0, "Learn to juggle").unwrap();
    repo.save(&card).await.unwrap();

    // Hand-edit the file so the item sits on the free space.
    let path = dir.path().join(format!("{}.json", card.id()));
    let mut json: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    json["items"][0]["position"] = serde_json::json!(12);
    tokio::fs::write(&path, serde_json::to_vec(&json).unwrap()).await.unwrap();

    let err = repo.load(card.id()).await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.message.contains("Invariant violation"));
    assert!(repo.list().await.unwrap().is_empty());
}
