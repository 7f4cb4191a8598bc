//! Cell-state to RGBA raster stage.
//!
//! Each cell's intensity is `state / max_state`. Per RGB channel the output
//! is `cell * (1 - background) * intensity + background`, scaled to a byte,
//! so the background color is the floor at intensity 0 and the cell color
//! is the peak hue at intensity 1. Alpha is always 255.

use std::sync::Arc;

use afterglow_common::GridSize;
use glam::Vec3;
use tracing::trace;

use crate::buffer::SharedPlane;
use crate::dispatch::{RowTask, WorkerDispatcher};
use crate::grid::Grid;

/// Bytes per pixel (RGBA).
pub const BYTES_PER_PIXEL: usize = 4;

/// A `width × height` RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorBuffer {
    size: GridSize,
    data: Vec<u8>,
}

impl ColorBuffer {
    /// Creates an all-zero buffer.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            data: vec![0; size.cell_count() * BYTES_PER_PIXEL],
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.size.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.size.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, returning the raw RGBA bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Pixels as `[r, g, b, a]` quads.
    #[must_use]
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels().get(self.size.index(x, y)).copied()
    }
}

/// Blends one channel and converts it to a byte.
#[inline]
fn channel(cell: f32, background: f32, intensity: f32) -> u8 {
    let value = cell * (1.0 - background) * intensity + background;
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Color of a single cell state.
#[must_use]
pub fn shade(state: u8, max_state: u8, cell_color: Vec3, background_color: Vec3) -> [u8; 4] {
    let intensity = f32::from(state) / f32::from(max_state.max(1));
    [
        channel(cell_color.x, background_color.x, intensity),
        channel(cell_color.y, background_color.y, intensity),
        channel(cell_color.z, background_color.z, intensity),
        255,
    ]
}

/// Row task shading one row of cells into the output plane.
#[derive(Debug)]
struct RasterTask {
    width: usize,
    palette: Vec<[u8; 4]>,
    cells: SharedPlane,
    out: SharedPlane,
}

impl RowTask for RasterTask {
    fn run_row(&self, row: usize) {
        let start = row * self.width;
        for index in start..start + self.width {
            let state = self.cells.get(index) as usize;
            // States above max_state only exist after a rule swap without reseed.
            let color = self.palette[state.min(self.palette.len() - 1)];
            let base = index * BYTES_PER_PIXEL;
            for (offset, &byte) in color.iter().enumerate() {
                self.out.set(base + offset, byte);
            }
        }
    }
}

/// Converts grid states into a [`ColorBuffer`] using the worker pool.
#[derive(Debug)]
pub struct RasterGenerator {
    out: SharedPlane,
    buffer: ColorBuffer,
}

impl RasterGenerator {
    /// Creates a generator for grids of `size`.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            out: SharedPlane::zeroed(size.cell_count() * BYTES_PER_PIXEL),
            buffer: ColorBuffer::new(size),
        }
    }

    /// The most recently rendered buffer.
    #[must_use]
    pub const fn buffer(&self) -> &ColorBuffer {
        &self.buffer
    }

    /// Renders the grid's current plane. Rows are shaded in parallel and
    /// the buffer is rebuilt from scratch.
    pub fn render(
        &mut self,
        grid: &Grid,
        max_state: u8,
        cell_color: Vec3,
        background_color: Vec3,
        dispatcher: &mut WorkerDispatcher,
    ) -> &ColorBuffer {
        let size = grid.size();
        if self.out.len() != size.cell_count() * BYTES_PER_PIXEL {
            self.out = SharedPlane::zeroed(size.cell_count() * BYTES_PER_PIXEL);
        }

        // Only max_state + 1 distinct colors exist, so shade each once.
        let palette = (0..=max_state)
            .map(|state| shade(state, max_state, cell_color, background_color))
            .collect();

        let task = Arc::new(RasterTask {
            width: size.width,
            palette,
            cells: grid.current().clone(),
            out: self.out.clone(),
        });
        dispatcher.run_phase(size.height, task);

        self.buffer = ColorBuffer {
            size,
            data: self.out.to_vec(),
        };
        trace!("Raster phase complete");
        &self.buffer
    }
}

/// Renders `grid` in one call with a temporary generator.
pub fn render(
    grid: &Grid,
    max_state: u8,
    cell_color: Vec3,
    background_color: Vec3,
    dispatcher: &mut WorkerDispatcher,
) -> ColorBuffer {
    let mut generator = RasterGenerator::new(grid.size());
    generator
        .render(grid, max_state, cell_color, background_color, dispatcher)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_on_black_extremes() {
        assert_eq!(shade(3, 3, Vec3::ONE, Vec3::ZERO), [255, 255, 255, 255]);
        assert_eq!(shade(0, 3, Vec3::ONE, Vec3::ZERO), [0, 0, 0, 255]);
    }

    #[test]
    fn test_background_is_floor() {
        let bg = Vec3::new(0.2, 0.4, 0.0);
        assert_eq!(shade(0, 1, Vec3::new(1.0, 0.0, 1.0), bg), [51, 102, 0, 255]);
        // cell color adds on top of the remaining headroom
        assert_eq!(shade(1, 1, Vec3::new(1.0, 0.0, 1.0), bg), [255, 102, 255, 255]);
    }

    #[test]
    fn test_intermediate_intensity() {
        let [r, g, b, a] = shade(1, 2, Vec3::new(1.0, 0.5, 0.0), Vec3::ZERO);
        assert_eq!((r, g, b, a), (128, 64, 0, 255));
    }

    #[test]
    fn test_out_of_range_colors_clamp() {
        assert_eq!(shade(1, 1, Vec3::splat(2.0), Vec3::ZERO), [255, 255, 255, 255]);
        assert_eq!(shade(0, 1, Vec3::ONE, Vec3::splat(-1.0)), [0, 0, 0, 255]);
    }

    #[test]
    fn test_render_grid() {
        let mut grid = Grid::new(GridSize::new(3, 2));
        grid.set(0, 0, 2);
        grid.set(2, 1, 1);
        let mut dispatcher = WorkerDispatcher::new(2);
        let buffer = render(&grid, 2, Vec3::ONE, Vec3::ZERO, &mut dispatcher);
        assert_eq!(buffer.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(buffer.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(buffer.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(buffer.pixel(2, 1), Some([128, 128, 128, 255]));
        assert_eq!(buffer.pixel(3, 0), None);
        assert!(buffer.pixels().iter().all(|p| p[3] == 255));
    }

    #[test]
    fn test_generator_tracks_grid_size() {
        let mut dispatcher = WorkerDispatcher::new(1);
        let mut generator = RasterGenerator::new(GridSize::new(2, 2));
        let grid = Grid::new(GridSize::new(4, 3));
        let buffer = generator.render(&grid, 1, Vec3::ONE, Vec3::ZERO, &mut dispatcher);
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
        assert_eq!(buffer.as_bytes().len(), 48);
    }
}
