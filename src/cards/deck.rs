//! Dealing: turning a batch of images into a shuffled deck of pairs.
//!
//! ## Layout
//!
//! Image `i` of the batch is dealt onto cards `2i` and `2i + 1`, so ids are
//! sequential and every image appears exactly twice. The sequence is then
//! shuffled with the session's `GameRng`.

use im::Vector;
use rustc_hash::{FxHashMap, FxHashSet};

use super::card::{Card, CardId};
use super::image::CardImage;
use crate::core::{GameRng, ImageSourceError, MAX_PAIR_COUNT};

/// Keep the first `count` distinct images (by id) of a fetched batch.
///
/// Services may return more images than asked for, or repeat one. Fewer
/// than `count` distinct images is a failed fetch.
pub fn select_distinct(
    images: Vec<CardImage>,
    count: usize,
) -> Result<Vec<CardImage>, ImageSourceError> {
    let mut seen = FxHashSet::default();
    let selected: Vec<CardImage> = images
        .into_iter()
        .filter(|image| seen.insert(image.id.clone()))
        .take(count)
        .collect();

    if selected.len() < count {
        return Err(ImageSourceError::Insufficient {
            requested: count,
            received: selected.len(),
        });
    }
    Ok(selected)
}

/// Deal two cards per image and shuffle them.
///
/// The batch must hold at most `MAX_PAIR_COUNT` images; the controller
/// rejects larger sessions before fetching.
#[must_use]
pub fn deal(images: &[CardImage], rng: &mut GameRng) -> Vector<Card> {
    debug_assert!(images.len() <= MAX_PAIR_COUNT);
    let mut cards = Vec::with_capacity(images.len() * 2);
    for (first, image) in (0u32..).step_by(2).zip(images) {
        cards.push(Card::new(CardId::new(first), image.clone()));
        cards.push(Card::new(CardId::new(first + 1), image.clone()));
    }

    rng.shuffle(&mut cards);
    cards.into_iter().collect()
}

/// Count how many cards carry each image id.
#[must_use]
pub fn pair_counts<'a>(cards: impl IntoIterator<Item = &'a Card>) -> FxHashMap<&'a str, usize> {
    let mut counts = FxHashMap::default();
    for card in cards {
        *counts.entry(card.image.id.as_str()).or_insert(0) += 1;
    }
    counts
}
