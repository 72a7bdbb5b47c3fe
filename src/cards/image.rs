//! Card images - the picture on the face of a card.
//!
//! A `CardImage` is what the image source hands back: an identifier and a
//! URL. Each image is dealt onto exactly two cards; two cards form a pair
//! when their image ids are equal.

use serde::{Deserialize, Serialize};

/// One of the distinct pictures dealt in a session.
///
/// Deserializes directly from TheCatAPI's `images/search` entries; fields
/// other than `id` and `url` (width, height, breeds) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardImage {
    /// Identifier assigned by the image service.
    pub id: String,

    /// Where the picture can be downloaded from.
    pub url: String,
}

impl CardImage {
    /// Create a new card image.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Check whether two images are the same picture.
    #[must_use]
    pub fn same_as(&self, other: &CardImage) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Display for CardImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Image({})", self.id)
    }
}
