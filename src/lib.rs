//! # cat-pairs
//!
//! A memory-matching card game: pairs of cat pictures are dealt face-down
//! and the player turns two at a time until every pair is found.
//!
//! ## Architecture
//!
//! - **Single writer**: One `GameController` task owns the session. Taps,
//!   image fetch results, and timer ticks are all serialized through it.
//!
//! - **Snapshots**: Every change publishes a new immutable `SessionState`.
//!   Cards live in an `im::Vector`, so snapshots are O(1) to clone.
//!
//! - **Epochs**: Each session start bumps a generation counter; late
//!   results from superseded sessions are discarded.
//!
//! ## Modules
//!
//! - `core`: Configuration, errors, logging, RNG
//! - `cards`: Card images, cards, dealing
//! - `images`: Image source contract and TheCatAPI client
//! - `session`: State machine, controller, snapshot store
//! - `layout`: Grid sizing heuristic
//!
//! ## Example
//!
//! ```no_run
//! use cat_pairs::{CatApiClient, GameConfig, GameController};
//!
//! # async fn run() -> cat_pairs::Result<()> {
//! let config = GameConfig::default().with_env_overrides();
//! let source = CatApiClient::new(&config.image_source)?;
//! let game = GameController::spawn(source, config);
//!
//! let mut updates = game.subscribe();
//! game.restart().await?;
//! while let Some(snapshot) = updates.next().await {
//!     println!("{:?} after {}s", snapshot.phase, snapshot.elapsed_seconds);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cards;
pub mod core;
pub mod images;
pub mod layout;
pub mod session;

// Re-export commonly used types
pub use crate::core::{Error, GameConfig, GameRng, ImageSourceConfig, ImageSourceError, Result};

pub use crate::cards::{Card, CardId, CardImage};

pub use crate::images::{CatApiClient, ImageSource};

pub use crate::layout::{calculate_card_size, GridLayout};

pub use crate::session::{
    GameController, GameHandle, Phase, SessionState, Snapshot, Subscription, TapOutcome,
};
