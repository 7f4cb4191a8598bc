//! Toroidal cell grid and spawn patterns.

use std::fmt;
use std::str::FromStr;

use afterglow_common::{AfterglowError, GridCoord, GridSize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::{CellBuffer, SharedPlane};

/// Radius of the [`SpawnPattern::Circle`] seed.
pub const CIRCLE_RADIUS: i64 = 10;

/// Initial layout written into the grid on construction and reset.
///
/// Every seeded cell is set to the rule's maximum state; everything else
/// is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    /// Each cell live with probability 1/2
    Random,
    /// A single live cell at the center
    #[default]
    Middle,
    /// A filled disc of radius [`CIRCLE_RADIUS`] around the center
    Circle,
    /// A full-width line through the center row
    HorizontalLine,
    /// A full-height line through the center column
    VerticalLine,
    /// Both center lines
    Cross,
}

impl SpawnPattern {
    /// Every pattern, in display order.
    pub const ALL: [Self; 6] = [
        Self::Random,
        Self::Middle,
        Self::Circle,
        Self::HorizontalLine,
        Self::VerticalLine,
        Self::Cross,
    ];

    /// Canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Middle => "middle",
            Self::Circle => "circle",
            Self::HorizontalLine => "horizontal_line",
            Self::VerticalLine => "vertical_line",
            Self::Cross => "cross",
        }
    }
}

impl fmt::Display for SpawnPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpawnPattern {
    type Err = AfterglowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('-', "_");
        match name.as_str() {
            "random" => Ok(Self::Random),
            "middle" | "center" | "point" => Ok(Self::Middle),
            "circle" | "middle_circle" => Ok(Self::Circle),
            "horizontal" | "horizontal_line" => Ok(Self::HorizontalLine),
            "vertical" | "vertical_line" => Ok(Self::VerticalLine),
            "cross" | "plus" => Ok(Self::Cross),
            _ => Err(AfterglowError::UnknownName {
                kind: "spawn pattern",
                name: s.to_string(),
            }),
        }
    }
}

/// A `width × height` torus of cell states.
///
/// The grid is never resized in place; a new size means a new `Grid`.
#[derive(Debug)]
pub struct Grid {
    cells: CellBuffer,
}

impl Grid {
    /// Creates an all-zero grid.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            cells: CellBuffer::new(size),
        }
    }

    /// Creates a grid and seeds it with `pattern`.
    #[must_use]
    pub fn seeded(
        size: GridSize,
        pattern: SpawnPattern,
        max_state: u8,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let mut grid = Self::new(size);
        grid.reseed(pattern, max_state, rng);
        grid
    }

    /// Clears both planes and writes `pattern` into the current one.
    pub fn reseed(&mut self, pattern: SpawnPattern, max_state: u8, rng: &mut fastrand::Rng) {
        let size = self.size();
        let plane = self.cells.current();
        plane.fill(0);
        self.cells.next().fill(0);

        let (mid_x, mid_y) = size.center();
        let (mid_x, mid_y) = (mid_x as i64, mid_y as i64);
        let mark = |x: i64, y: i64| {
            plane.set(size.wrapped_index(GridCoord::new(x, y)), max_state);
        };

        match pattern {
            SpawnPattern::Random => {
                for index in 0..size.cell_count() {
                    if rng.bool() {
                        plane.set(index, max_state);
                    }
                }
            },
            SpawnPattern::Middle => mark(mid_x, mid_y),
            SpawnPattern::Circle => {
                let r = CIRCLE_RADIUS;
                for dx in -r..r {
                    for dy in -r..r {
                        if dx * dx + dy * dy <= r * r {
                            mark(mid_x + dx, mid_y + dy);
                        }
                    }
                }
            },
            SpawnPattern::HorizontalLine => {
                for x in 0..size.width as i64 {
                    mark(x, mid_y);
                }
            },
            SpawnPattern::VerticalLine => {
                for y in 0..size.height as i64 {
                    mark(mid_x, y);
                }
            },
            SpawnPattern::Cross => {
                for x in 0..size.width as i64 {
                    mark(x, mid_y);
                }
                for y in 0..size.height as i64 {
                    mark(mid_x, y);
                }
            },
        }

        debug!(
            "Seeded {}x{} grid with {pattern} pattern",
            size.width, size.height
        );
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.cells.size()
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.cells.size().width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.cells.size().height
    }

    /// State of the cell at `(x, y)`, wrapping out-of-range coordinates.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> u8 {
        self.cells
            .current()
            .get(self.size().wrapped_index(GridCoord::new(x, y)))
    }

    /// Overwrites the cell at `(x, y)`, wrapping out-of-range coordinates.
    ///
    /// Only call between steps; the caller keeps `state <= max_state`.
    pub fn set(&mut self, x: i64, y: i64, state: u8) {
        let index = self.size().wrapped_index(GridCoord::new(x, y));
        self.cells.current().set(index, state);
    }

    /// Copy of the current cell states, row-major.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.cells.current().to_vec()
    }

    /// Number of cells at `max_state`.
    #[must_use]
    pub fn live_count(&self, max_state: u8) -> usize {
        let plane = self.cells.current();
        (0..plane.len())
            .filter(|&index| plane.get(index) == max_state)
            .count()
    }

    /// Finalized current-generation plane.
    #[must_use]
    pub const fn current(&self) -> &SharedPlane {
        self.cells.current()
    }

    /// Plane the next generation is written into.
    #[must_use]
    pub const fn next(&self) -> &SharedPlane {
        self.cells.next()
    }

    /// Promotes the next plane to current.
    pub fn swap(&mut self) {
        self.cells.swap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(size: GridSize, pattern: SpawnPattern) -> Grid {
        Grid::seeded(size, pattern, 3, &mut fastrand::Rng::with_seed(7))
    }

    #[test]
    fn test_middle_pattern() {
        let grid = seeded(GridSize::new(5, 5), SpawnPattern::Middle);
        assert_eq!(grid.get(2, 2), 3);
        assert_eq!(grid.live_count(3), 1);
    }

    #[test]
    fn test_lines_and_cross() {
        let size = GridSize::new(6, 4);
        assert_eq!(seeded(size, SpawnPattern::HorizontalLine).live_count(3), 6);
        assert_eq!(seeded(size, SpawnPattern::VerticalLine).live_count(3), 4);
        // the center cell is shared by both lines
        assert_eq!(seeded(size, SpawnPattern::Cross).live_count(3), 9);
    }

    #[test]
    fn test_circle_pattern() {
        let grid = seeded(GridSize::new(64, 64), SpawnPattern::Circle);
        assert_eq!(grid.get(32, 32), 3);
        assert_eq!(grid.get(32 - 10, 32), 3);
        assert_eq!(grid.get(32 + 10, 32), 0);
        assert_eq!(grid.get(32 - 8, 32 - 8), 0);
    }

    #[test]
    fn test_circle_wraps_on_small_grid() {
        let grid = seeded(GridSize::new(8, 8), SpawnPattern::Circle);
        assert_eq!(grid.live_count(3), 64);
    }

    #[test]
    fn test_random_pattern_density() {
        let grid = seeded(GridSize::new(100, 100), SpawnPattern::Random);
        let live = grid.live_count(3);
        assert!((4000..6000).contains(&live), "live = {live}");
        assert!(grid.snapshot().iter().all(|&s| s == 0 || s == 3));
    }

    #[test]
    fn test_random_pattern_seeded_is_reproducible() {
        let a = seeded(GridSize::new(32, 32), SpawnPattern::Random);
        let b = seeded(GridSize::new(32, 32), SpawnPattern::Random);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_reseed_clears_previous_state() {
        let mut grid = seeded(GridSize::new(10, 10), SpawnPattern::Cross);
        grid.reseed(SpawnPattern::Middle, 3, &mut fastrand::Rng::with_seed(1));
        assert_eq!(grid.live_count(3), 1);
    }

    #[test]
    fn test_get_wraps() {
        let mut grid = Grid::new(GridSize::new(4, 3));
        grid.set(3, 1, 2);
        assert_eq!(grid.get(-1, 1), 2);
        assert_eq!(grid.get(7, 4), 2);
    }

    #[test]
    fn test_spawn_pattern_from_str() {
        assert_eq!("Plus".parse::<SpawnPattern>().ok(), Some(SpawnPattern::Cross));
        assert_eq!(
            "horizontal-line".parse::<SpawnPattern>().ok(),
            Some(SpawnPattern::HorizontalLine)
        );
        assert_eq!("center".parse::<SpawnPattern>().ok(), Some(SpawnPattern::Middle));
        assert!("spiral".parse::<SpawnPattern>().is_err());
        for pattern in SpawnPattern::ALL {
            assert_eq!(pattern.name().parse::<SpawnPattern>().ok(), Some(pattern));
        }
    }
}
