//! Cards - runtime state of one face-down tile.
//!
//! A `Card` carries its image plus four flags:
//!
//! - `is_covered`: face-down. Only goes back to `true` when a mismatched
//!   pair is turned over again.
//! - `is_revealed`: drives the flip animation; always `!is_covered`.
//! - `is_matched`: monotone, never reverts.
//! - `is_shaking`: cosmetic, set only during mismatch feedback.

use serde::{Deserialize, Serialize};

use super::image::CardImage;

/// Unique identifier for a card within a session.
///
/// Ids run `0..2N` in deal order; image `i` is dealt onto ids `2i` and
/// `2i + 1`. Shuffling changes positions, never ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// A card on the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub image: CardImage,
    pub is_covered: bool,
    pub is_matched: bool,
    pub is_revealed: bool,
    pub is_shaking: bool,
}

impl Card {
    /// Create a face-down, unmatched card.
    #[must_use]
    pub fn new(id: CardId, image: CardImage) -> Self {
        Self {
            id,
            image,
            is_covered: true,
            is_matched: false,
            is_revealed: false,
            is_shaking: false,
        }
    }

    /// Is this card face-up but not yet part of a found pair?
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.is_covered && !self.is_matched
    }

    /// Do the two cards show the same picture?
    #[must_use]
    pub fn pairs_with(&self, other: &Card) -> bool {
        self.id != other.id && self.image.same_as(&other.image)
    }

    /// URL to render, only while the card is face-up.
    #[must_use]
    pub fn visible_url(&self) -> Option<&str> {
        (!self.is_covered).then_some(self.image.url.as_str())
    }

    // === Transitions ===

    /// Turn the card face-up.
    pub fn flip_up(&mut self) {
        self.is_covered = false;
        self.is_revealed = true;
    }

    /// Turn the card face-down again after a mismatch.
    ///
    /// Matched cards stay face-up.
    pub fn cover(&mut self) {
        if self.is_matched {
            return;
        }
        self.is_covered = true;
        self.is_revealed = false;
        self.is_shaking = false;
    }

    /// Mark the card as part of a found pair.
    pub fn mark_matched(&mut self) {
        self.is_matched = true;
        self.is_covered = false;
        self.is_revealed = true;
        self.is_shaking = false;
    }

    /// Start or stop the mismatch shake.
    pub fn set_shaking(&mut self, shaking: bool) {
        self.is_shaking = shaking;
    }
}
