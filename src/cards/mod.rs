//! Card system: images, cards, and dealing.
//!
//! ## Key Types
//!
//! - `CardImage`: A picture from the image source (id + URL)
//! - `CardId`: Identifier of one card within a session
//! - `Card`: Runtime card state (covered, revealed, matched, shaking)
//!
//! `deck::deal` lays out two cards per image and shuffles them.

pub mod card;
pub mod deck;
pub mod image;

pub use card::{Card, CardId};
pub use deck::{deal, pair_counts, select_distinct};
pub use image::CardImage;
