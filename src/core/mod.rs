//! Core building blocks: configuration, errors, logging, RNG.
//!
//! Nothing here knows about cards or sessions; the game modules build on
//! these types.

pub mod config;
pub mod error;
pub mod logging;
pub mod rng;

pub use config::{GameConfig, ImageSourceConfig, API_KEY_ENV, DEFAULT_PAIR_COUNT, MAX_PAIR_COUNT};
pub use error::{Error, ImageSourceError, Result};
pub use rng::GameRng;
