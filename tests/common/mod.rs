//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cat_pairs::{
    CardId, CardImage, GameConfig, GameController, GameHandle, ImageSource, ImageSourceError,
    Snapshot,
};

/// Returns `cat0 .. catN` with predictable URLs.
#[derive(Default)]
pub struct NumberedCats {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageSource for NumberedCats {
    async fn fetch(&self, count: usize) -> Result<Vec<CardImage>, ImageSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(numbered("cat", count))
    }
}

/// Always fails, like a request without network.
pub struct Offline;

#[async_trait]
impl ImageSource for Offline {
    async fn fetch(&self, _count: usize) -> Result<Vec<CardImage>, ImageSourceError> {
        Err(ImageSourceError::other("network unreachable"))
    }
}

/// Fails the first `failures` calls, then behaves like `NumberedCats`.
pub struct Flaky {
    pub failures: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageSource for Flaky {
    async fn fetch(&self, count: usize) -> Result<Vec<CardImage>, ImageSourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ImageSourceError::Status { status: 503 });
        }
        Ok(numbered("cat", count))
    }
}

/// First call is slow and returns `slow*` images; later calls answer at
/// once with `fast*` images.
#[derive(Default)]
pub struct SlowThenFast {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ImageSource for SlowThenFast {
    async fn fetch(&self, count: usize) -> Result<Vec<CardImage>, ImageSourceError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_secs(5)).await;
            return Ok(numbered("slow", count));
        }
        Ok(numbered("fast", count))
    }
}

/// Returns one image fewer than requested.
pub struct Stingy;

#[async_trait]
impl ImageSource for Stingy {
    async fn fetch(&self, count: usize) -> Result<Vec<CardImage>, ImageSourceError> {
        Ok(numbered("cat", count.saturating_sub(1)))
    }
}

pub fn numbered(prefix: &str, count: usize) -> Vec<CardImage> {
    (0..count)
        .map(|i| CardImage::new(format!("{prefix}{i}"), format!("https://img/{prefix}{i}.jpg")))
        .collect()
}

pub fn test_config() -> GameConfig {
    GameConfig::new().with_seed(42)
}

pub fn spawn<S: ImageSource + 'static>(source: S) -> GameHandle {
    GameController::spawn(source, test_config())
}

/// Start a session and wait until its cards are on the table.
///
/// Waits for the new epoch, so a previous session that is still playing
/// is never mistaken for the new one.
pub async fn start_playing(handle: &GameHandle, pairs: usize) -> Snapshot {
    let mut sub = handle.subscribe();
    let previous = handle.snapshot().epoch;
    handle.start_session(pairs).await.unwrap();
    sub.wait_for(|s| s.epoch > previous && s.phase.is_playing())
        .await
        .unwrap()
}

/// Card ids grouped by image, in display order of the first card.
pub fn pairs(snapshot: &Snapshot) -> Vec<(CardId, CardId)> {
    let mut pairs = Vec::new();
    for (i, card) in snapshot.cards.iter().enumerate() {
        if let Some(partner) = snapshot
            .cards
            .iter()
            .skip(i + 1)
            .find(|other| other.image.same_as(&card.image))
        {
            pairs.push((card.id, partner.id));
        }
    }
    pairs
}

/// Find a card whose image differs from `card_id`'s.
pub fn non_partner(snapshot: &Snapshot, card_id: CardId) -> CardId {
    let card = snapshot.card(card_id).unwrap();
    snapshot
        .cards
        .iter()
        .find(|other| !other.image.same_as(&card.image))
        .map(|other| other.id)
        .unwrap()
}

/// Find the card sharing `card_id`'s image.
pub fn partner(snapshot: &Snapshot, card_id: CardId) -> CardId {
    let card = snapshot.card(card_id).unwrap();
    snapshot
        .cards
        .iter()
        .find(|other| other.pairs_with(card))
        .map(|other| other.id)
        .unwrap()
}
