//! Headless run loop.
//!
//! Builds a simulation from the config, runs the requested number of
//! generations (paced or flat out), optionally exports frames, and logs
//! throughput at the end.

use std::thread;
use std::time::{Duration, Instant};

use afterglow_kernel::{Simulation, Timer};
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::export::{ExportSummary, FrameExporter};

/// Idle time between pacer polls when a generation is not yet due.
const PACING_POLL: Duration = Duration::from_millis(1);

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Generations stepped
    pub generations: u64,
    /// Cells at the maximum state after the last generation
    pub live_cells: usize,
    /// Export totals (zero when export is disabled)
    pub export: ExportSummary,
}

/// Builds the simulation described by `config`.
pub fn build_simulation(config: &EngineConfig) -> Result<Simulation> {
    let rule = config
        .resolve_rule()
        .with_context(|| format!("invalid rule '{}'", config.rule))?;

    Ok(Simulation::with_settings(
        config.width,
        config.height,
        rule,
        config.resolve_spawn(),
        config.cell_color(),
        config.background_color(),
        &config.simulation_settings(),
    ))
}

/// Runs the simulation to completion.
pub fn run(config: &EngineConfig) -> Result<RunReport> {
    let mut sim = build_simulation(config)?;

    let exporter = config
        .export_dir
        .as_deref()
        .map(FrameExporter::start)
        .transpose()
        .context("failed to start frame export")?;

    if let Some(exporter) = &exporter {
        exporter.submit(0, sim.color_buffer().clone());
    }

    let timer = Timer::start(format!("{} generations", config.generations));
    let mut last_tick = Instant::now();

    while sim.generation() < config.generations {
        let generation = sim.generation() + 1;
        let stepped = if config.speed == 0 {
            Some(sim.step())
        } else {
            let now = Instant::now();
            let dt = now.duration_since(last_tick).as_secs_f32();
            last_tick = now;
            sim.advance(dt)
        };

        let Some(frame) = stepped else {
            thread::sleep(PACING_POLL);
            continue;
        };

        if let Some(exporter) = &exporter {
            if generation % config.export_every.max(1) == 0 {
                exporter.submit(generation, frame.clone());
            }
        }
        debug!("Generation {generation}: {} live cells", sim.live_count());
    }

    timer.stop_and_log();
    info!("Step timing: {}", sim.stats().format());

    let export = exporter.map(FrameExporter::finish).unwrap_or_default();
    if config.export_dir.is_some() {
        info!("Exported {} frames ({} failed)", export.written, export.failed);
    }

    Ok(RunReport {
        generations: sim.generation(),
        live_cells: sim.live_count(),
        export,
    })
}
