//! Square-card grid heuristic.
//!
//! The column count follows the viewport's aspect ratio so the grid is
//! roughly as wide as it is tall in card units:
//!
//! ```text
//! columns   = clamp(round(sqrt(count * width / height)), 2, count)
//! rows      = ceil(count / columns)
//! card_size = min((width  - spacing * (columns + 1)) / columns,
//!                 (height - spacing * (rows    + 1)) / rows)
//! ```
//!
//! ```
//! use cat_pairs::layout::calculate_card_size;
//!
//! let grid = calculate_card_size(12, 360.0, 640.0, 8.0);
//! assert_eq!((grid.columns, grid.rows), (3, 4));
//! assert!(grid.fits(360.0, 640.0, 8.0));
//! ```

use serde::{Deserialize, Serialize};

/// Result of the grid heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    /// Edge length of each square card.
    pub card_size: f32,
}

impl GridLayout {
    /// An empty grid.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            columns: 0,
            rows: 0,
            card_size: 0.0,
        }
    }

    /// Width occupied by the cards and the gaps around them.
    #[must_use]
    pub fn total_width(&self, spacing: f32) -> f32 {
        self.columns as f32 * self.card_size + spacing * (self.columns + 1) as f32
    }

    /// Height occupied by the cards and the gaps around them.
    #[must_use]
    pub fn total_height(&self, spacing: f32) -> f32 {
        self.rows as f32 * self.card_size + spacing * (self.rows + 1) as f32
    }

    /// Does the grid fit inside the viewport?
    #[must_use]
    pub fn fits(&self, width: f32, height: f32, spacing: f32) -> bool {
        // Allow for float rounding in the divisions above.
        const EPSILON: f32 = 1e-3;
        self.total_width(spacing) <= width + EPSILON
            && self.total_height(spacing) <= height + EPSILON
    }

    /// Grid position (row, column) of the card at `index` in deal order.
    #[must_use]
    pub fn position_of(&self, index: usize) -> Option<(usize, usize)> {
        if self.columns == 0 {
            return None;
        }
        Some((index / self.columns, index % self.columns))
    }
}

/// Compute columns, rows, and card edge length for `count` cards.
///
/// Degenerate inputs give degenerate but valid grids: no cards means an
/// empty grid, a single card gets one column, and a viewport too small to
/// hold the spacing gets `card_size == 0`.
#[must_use]
pub fn calculate_card_size(count: usize, width: f32, height: f32, spacing: f32) -> GridLayout {
    if count == 0 {
        return GridLayout::empty();
    }

    let columns = if width > 0.0 && height > 0.0 {
        let approximate = (count as f32 * width / height).sqrt().round();
        // `as usize` saturates, so NaN and huge values stay in range.
        (approximate as usize).clamp(2.min(count), count)
    } else {
        2.min(count)
    };
    let rows = count.div_ceil(columns);

    let available_width = width - spacing * (columns + 1) as f32;
    let available_height = height - spacing * (rows + 1) as f32;

    let card_width = available_width / columns as f32;
    let card_height = available_height / rows as f32;
    let card_size = card_width.min(card_height).max(0.0);

    GridLayout {
        columns,
        rows,
        card_size,
    }
}
