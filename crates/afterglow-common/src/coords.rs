//! Grid dimensions and toroidal cell coordinates.

use serde::{Deserialize, Serialize};

/// Dimensions of a cell grid.
///
/// Both axes are at least 1; [`GridSize::new`] clamps smaller requests
/// instead of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
}

impl GridSize {
    /// Creates a grid size, clamping each axis to a minimum of 1.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width * self.height
    }

    /// Linear index of an in-bounds `(x, y)`.
    #[must_use]
    pub const fn index(self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Center cell, rounding down on even axes.
    #[must_use]
    pub const fn center(self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Wraps a signed coordinate onto the torus.
    #[must_use]
    pub const fn wrap(self, coord: GridCoord) -> (usize, usize) {
        (
            wrap_axis(coord.x, self.width),
            wrap_axis(coord.y, self.height),
        )
    }

    /// Linear index of a signed coordinate after toroidal wrapping.
    #[must_use]
    pub const fn wrapped_index(self, coord: GridCoord) -> usize {
        let (x, y) = self.wrap(coord);
        self.index(x, y)
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(800, 800)
    }
}

/// Signed cell coordinate that may lie outside the grid.
///
/// Out-of-range values are folded back with [`GridSize::wrap`], so the
/// grid has no edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column
    pub x: i64,
    /// Row
    pub y: i64,
}

impl GridCoord {
    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Folds `value` into `[0, len)`: `((value mod len) + len) mod len`.
#[must_use]
pub const fn wrap_axis(value: i64, len: usize) -> usize {
    value.rem_euclid(len as i64) as usize
}
