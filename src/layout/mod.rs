//! Grid sizing for laying the cards out on screen.
//!
//! Pure and deterministic: the same card count and viewport always give
//! the same grid.

pub mod grid;

pub use grid::{calculate_card_size, GridLayout};
