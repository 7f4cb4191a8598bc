//! Driver-facing simulation API.
//!
//! A [`Simulation`] owns the rule, the grid, the worker pool and the raster
//! stage. Per generation, [`Simulation::step`] runs the transition phase,
//! swaps the grid planes, then runs the raster phase and returns the fresh
//! color buffer. The two phases never overlap.

use std::sync::Arc;
use std::time::Instant;

use afterglow_common::{GridSize, RuleParseError};
use glam::Vec3;
use tracing::{debug, info};

use crate::benchmark::StepStats;
use crate::dispatch::{WorkerDispatcher, DEFAULT_WORKER_COUNT};
use crate::grid::{Grid, SpawnPattern};
use crate::pacing::{StepPacer, DEFAULT_SPEED};
use crate::presets::Preset;
use crate::raster::{ColorBuffer, RasterGenerator};
use crate::rule::RuleSpec;
use crate::transition;

/// Tunables owned by a simulation instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Worker threads shared by both phases (clamped to at least 1)
    pub worker_count: usize,
    /// Seed for random spawns; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Generations per second for [`Simulation::advance`]
    pub speed: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            seed: None,
            speed: DEFAULT_SPEED,
        }
    }
}

/// A running multi-state automaton.
#[derive(Debug)]
pub struct Simulation {
    rule: Arc<RuleSpec>,
    grid: Grid,
    spawn: SpawnPattern,
    dispatcher: WorkerDispatcher,
    raster: RasterGenerator,
    rng: fastrand::Rng,
    pacer: StepPacer,
    stats: StepStats,
    generation: u64,
    /// Peak color of a cell at `max_state`, read at the next raster phase
    pub cell_color: Vec3,
    /// Color of a cell at state 0, read at the next raster phase
    pub background_color: Vec3,
}

impl Simulation {
    /// Creates a simulation with default settings.
    ///
    /// Width and height below 1 are clamped to 1. The grid is seeded and
    /// the first color buffer rendered before returning.
    #[must_use]
    pub fn new(
        width: usize,
        height: usize,
        rule: RuleSpec,
        spawn: SpawnPattern,
        cell_color: Vec3,
        background_color: Vec3,
    ) -> Self {
        Self::with_settings(
            width,
            height,
            rule,
            spawn,
            cell_color,
            background_color,
            &SimulationSettings::default(),
        )
    }

    /// Creates a simulation with explicit settings.
    #[must_use]
    pub fn with_settings(
        width: usize,
        height: usize,
        rule: RuleSpec,
        spawn: SpawnPattern,
        cell_color: Vec3,
        background_color: Vec3,
        settings: &SimulationSettings,
    ) -> Self {
        let size = GridSize::new(width, height);
        let mut rng = settings
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let grid = Grid::seeded(size, spawn, rule.max_state(), &mut rng);

        info!(
            "Simulation created: {}x{}, rule {}, spawn {spawn}, {} workers",
            size.width, size.height, rule, settings.worker_count
        );

        let mut simulation = Self {
            rule: Arc::new(rule),
            grid,
            spawn,
            dispatcher: WorkerDispatcher::new(settings.worker_count),
            raster: RasterGenerator::new(size),
            rng,
            pacer: StepPacer::new(settings.speed),
            stats: StepStats::new(),
            generation: 0,
            cell_color,
            background_color,
        };
        simulation.render();
        simulation
    }

    /// Creates a simulation from a preset, using its customary spawn pattern.
    #[must_use]
    pub fn from_preset(
        width: usize,
        height: usize,
        preset: Preset,
        cell_color: Vec3,
        background_color: Vec3,
        settings: &SimulationSettings,
    ) -> Self {
        Self::with_settings(
            width,
            height,
            preset.rule(),
            preset.spawn(),
            cell_color,
            background_color,
            settings,
        )
    }

    /// Runs one generation and returns the new color buffer.
    pub fn step(&mut self) -> &ColorBuffer {
        let started = Instant::now();
        transition::step(&mut self.grid, &self.rule, &mut self.dispatcher);
        self.generation += 1;
        self.stats.record(started.elapsed());
        self.render()
    }

    /// Feeds `dt` seconds to the pacer and steps if a generation is due.
    pub fn advance(&mut self, dt: f32) -> Option<&ColorBuffer> {
        if self.pacer.tick(dt) {
            Some(self.step())
        } else {
            None
        }
    }

    /// Re-renders the current generation, picking up color changes.
    pub fn render(&mut self) -> &ColorBuffer {
        self.raster.render(
            &self.grid,
            self.rule.max_state(),
            self.cell_color,
            self.background_color,
            &mut self.dispatcher,
        )
    }

    /// Re-seeds every cell with `spawn` and resets the generation counter.
    pub fn reset(&mut self, spawn: SpawnPattern) {
        self.spawn = spawn;
        self.grid
            .reseed(spawn, self.rule.max_state(), &mut self.rng);
        self.generation = 0;
        debug!("Simulation reset with {spawn} pattern");
        self.render();
    }

    /// Re-seeds with the current spawn pattern.
    pub fn restart(&mut self) {
        self.reset(self.spawn);
    }

    /// Replaces the worker pool (clamped to at least 1 thread). Takes
    /// effect from the next phase.
    pub fn set_worker_count(&mut self, worker_count: usize) {
        self.dispatcher.resize(worker_count);
    }

    /// Parses `text` and, on success, switches to that rule and re-seeds
    /// the grid. On error nothing changes.
    pub fn set_rule(&mut self, text: &str) -> Result<(), RuleParseError> {
        let rule = RuleSpec::parse(text)?;
        self.replace_rule(rule);
        Ok(())
    }

    /// Switches to `rule` and re-seeds the grid.
    pub fn replace_rule(&mut self, rule: RuleSpec) {
        info!("Rule changed: {} -> {}", self.rule, rule);
        self.rule = Arc::new(rule);
        self.restart();
    }

    /// Replaces the grid with a freshly seeded one of the new size
    /// (each axis clamped to at least 1).
    pub fn resize(&mut self, width: usize, height: usize) {
        let size = GridSize::new(width, height);
        self.grid = Grid::seeded(size, self.spawn, self.rule.max_state(), &mut self.rng);
        self.raster = RasterGenerator::new(size);
        self.generation = 0;
        info!("Simulation resized to {}x{}", size.width, size.height);
        self.render();
    }

    /// The active rule.
    #[must_use]
    pub fn rule(&self) -> &RuleSpec {
        &self.rule
    }

    /// Spawn pattern used by [`Simulation::restart`].
    #[must_use]
    pub const fn spawn_pattern(&self) -> SpawnPattern {
        self.spawn
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.grid.size()
    }

    /// Generations since the last reset.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Worker threads requested for the pool.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.dispatcher.worker_count()
    }

    /// The most recent color buffer.
    #[must_use]
    pub const fn color_buffer(&self) -> &ColorBuffer {
        self.raster.buffer()
    }

    /// State of the cell at `(x, y)`, wrapping toroidally.
    #[must_use]
    pub fn cell(&self, x: i64, y: i64) -> u8 {
        self.grid.get(x, y)
    }

    /// Overwrites the cell at `(x, y)`, clamping `state` to `max_state`.
    /// The color buffer is refreshed on the next step or render.
    pub fn set_cell(&mut self, x: i64, y: i64, state: u8) {
        self.grid.set(x, y, state.min(self.rule.max_state()));
    }

    /// Copy of all cell states, row-major.
    #[must_use]
    pub fn cells(&self) -> Vec<u8> {
        self.grid.snapshot()
    }

    /// Number of cells at `max_state`.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.grid.live_count(self.rule.max_state())
    }

    /// Step timing collected so far.
    #[must_use]
    pub const fn stats(&self) -> &StepStats {
        &self.stats
    }

    /// Generation pacing.
    #[must_use]
    pub const fn pacer(&self) -> &StepPacer {
        &self.pacer
    }

    /// Mutable generation pacing (speed, pause, single step).
    pub fn pacer_mut(&mut self) -> &mut StepPacer {
        &mut self.pacer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(workers: usize) -> SimulationSettings {
        SimulationSettings {
            worker_count: workers,
            seed: Some(42),
            speed: 10,
        }
    }

    fn life(width: usize, height: usize, spawn: SpawnPattern) -> Simulation {
        Simulation::with_settings(
            width,
            height,
            Preset::ConwaysLife.rule(),
            spawn,
            Vec3::ONE,
            Vec3::ZERO,
            &settings(2),
        )
    }

    #[test]
    fn test_construction_renders_first_buffer() {
        let sim = life(8, 6, SpawnPattern::Middle);
        let buffer = sim.color_buffer();
        assert_eq!((buffer.width(), buffer.height()), (8, 6));
        assert_eq!(buffer.pixel(4, 3), Some([255, 255, 255, 255]));
        assert_eq!(buffer.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_blinker_oscillates() {
        let mut sim = life(5, 5, SpawnPattern::Middle);
        sim.set_cell(1, 2, 1);
        sim.set_cell(3, 2, 1);
        sim.step();
        assert_eq!(sim.cell(2, 1), 1);
        assert_eq!(sim.cell(2, 3), 1);
        assert_eq!(sim.cell(1, 2), 0);
        sim.step();
        assert_eq!(sim.cell(1, 2), 1);
        assert_eq!(sim.cell(3, 2), 1);
        assert_eq!(sim.generation(), 2);
        assert_eq!(sim.stats().generations, 2);
    }

    #[test]
    fn test_clamped_dimensions() {
        let sim = life(0, 0, SpawnPattern::Middle);
        assert_eq!(sim.size(), GridSize::new(1, 1));
    }

    #[test]
    fn test_set_rule_failure_keeps_state() {
        let mut sim = life(16, 16, SpawnPattern::Cross);
        sim.step();
        let before = sim.cells();
        let generation = sim.generation();

        assert!(sim.set_rule("2,3/3/M").is_err());
        assert_eq!(sim.rule().source_text(), "2,3/3/1/M");
        assert_eq!(sim.cells(), before);
        assert_eq!(sim.generation(), generation);
    }

    #[test]
    fn test_set_rule_success_reseeds() {
        let mut sim = life(16, 16, SpawnPattern::Middle);
        sim.step();
        sim.set_rule("0-4/1-3/3/M").expect("valid rule");
        assert_eq!(sim.rule().max_state(), 3);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.cell(8, 8), 3);
        assert_eq!(sim.live_count(), 1);
    }

    #[test]
    fn test_afterglow_trail_decays() {
        let mut sim = Simulation::with_settings(
            9,
            9,
            RuleSpec::parse("8/8/3/M").expect("valid rule"),
            SpawnPattern::Middle,
            Vec3::ONE,
            Vec3::ZERO,
            &settings(3),
        );
        let states: Vec<u8> = (0..4)
            .map(|_| {
                sim.step();
                sim.cell(4, 4)
            })
            .collect();
        assert_eq!(states, vec![2, 1, 0, 0]);
    }

    #[test]
    fn test_reset_and_resize() {
        let mut sim = life(10, 10, SpawnPattern::Middle);
        sim.reset(SpawnPattern::HorizontalLine);
        assert_eq!(sim.spawn_pattern(), SpawnPattern::HorizontalLine);
        assert_eq!(sim.live_count(), 10);

        sim.resize(20, 4);
        assert_eq!(sim.size(), GridSize::new(20, 4));
        assert_eq!(sim.live_count(), 20);
        assert_eq!(sim.color_buffer().as_bytes().len(), 20 * 4 * 4);
    }

    #[test]
    fn test_worker_count_changes_between_steps() {
        let mut a = life(24, 24, SpawnPattern::Random);
        let mut b = life(24, 24, SpawnPattern::Random);
        b.set_worker_count(0);
        assert_eq!(b.worker_count(), 1);
        for _ in 0..5 {
            a.step();
            b.step();
        }
        b.set_worker_count(7);
        a.step();
        b.step();
        assert_eq!(a.cells(), b.cells());
        assert_eq!(a.color_buffer(), b.color_buffer());
    }

    #[test]
    fn test_color_change_applies_on_render() {
        let mut sim = life(3, 3, SpawnPattern::Middle);
        sim.cell_color = Vec3::new(1.0, 0.0, 0.0);
        sim.background_color = Vec3::new(0.0, 0.0, 1.0);
        let buffer = sim.render();
        assert_eq!(buffer.pixel(1, 1), Some([255, 0, 255, 255]));
        assert_eq!(buffer.pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_advance_respects_pacer() {
        let mut sim = life(4, 4, SpawnPattern::Middle);
        assert!(sim.advance(0.01).is_none());
        assert!(sim.advance(0.2).is_some());
        sim.pacer_mut().pause();
        assert!(sim.advance(1.0).is_none());
        assert_eq!(sim.generation(), 1);
    }
}
