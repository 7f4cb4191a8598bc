//! # Afterglow Kernel
//!
//! A multi-state cellular automaton on a toroidal grid, rendered to RGBA
//! each generation.
//!
//! This crate provides:
//! - The `SURVIVE/BORN/STATES/MODE` rule grammar and parser
//! - A double-buffered cell grid with spawn patterns
//! - A threaded transition engine with afterglow decay
//! - A threaded raster stage producing RGBA color buffers
//! - A reusable row-partitioned worker pool shared by both phases
//!
//! ## State Machine
//!
//! Cells hold a state in `0..=max_state`. Only neighbors at `max_state`
//! count. A live cell that fails to survive drops to `max_state - 1` and
//! keeps decaying by one per generation until it reaches 0, leaving a
//! fading trail.
//!
//! ## Double Buffering
//!
//! Each step reads the current plane and writes the next one, then swaps.
//! Rows are independent, so workers process them in any order without
//! locking the cell storage; only the row queue is locked.
//!
//! ## Example
//!
//! ```
//! use afterglow_kernel::{RuleSpec, Simulation, SpawnPattern};
//! use glam::Vec3;
//!
//! let rule = RuleSpec::parse("0-4/1-3/3/M").expect("valid rule");
//! let mut sim = Simulation::new(64, 64, rule, SpawnPattern::Circle, Vec3::ONE, Vec3::ZERO);
//! let frame = sim.step();
//! assert_eq!(frame.as_bytes().len(), 64 * 64 * 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod benchmark;
pub mod buffer;
pub mod dispatch;
pub mod grid;
pub mod pacing;
pub mod presets;
pub mod raster;
pub mod rule;
pub mod simulation;
pub mod transition;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::benchmark::*;
    pub use crate::buffer::*;
    pub use crate::dispatch::*;
    pub use crate::grid::*;
    pub use crate::pacing::*;
    pub use crate::presets::*;
    pub use crate::raster::*;
    pub use crate::rule::*;
    pub use crate::simulation::*;
    pub use crate::transition::{count_live_neighbors, next_state, TransitionTask};
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_exports() {
        let rule = parse("2,3/3/1/M").expect("valid rule");
        assert_eq!(rule.mode(), NeighborhoodMode::Moore);
        assert_eq!(Preset::ALL.len(), SpawnPattern::ALL.len());
    }
}
