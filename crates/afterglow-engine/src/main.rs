//! # Afterglow
//!
//! Headless driver for the multi-state automaton. Loads `afterglow.toml`
//! (or `--config`), applies command-line overrides, runs the configured
//! number of generations and optionally writes PNG frames.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod export;

use std::path::PathBuf;

use afterglow_kernel::{Preset, SpawnPattern};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, CONFIG_FILE, MAX_SEED};

/// Command-line options. Every option overrides the config file.
#[derive(Debug, Parser)]
#[command(name = "afterglow", version, about = "Multi-state toroidal cellular automaton")]
struct Args {
    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Rule text, e.g. "0-4/1-3/3/M"
    #[arg(long, value_name = "SURVIVE/BORN/STATES/MODE")]
    rule: Option<String>,
    /// Named rule preset (see --list-presets)
    #[arg(long, value_name = "NAME")]
    preset: Option<Preset>,
    /// Spawn pattern: random, middle, circle, horizontal, vertical, cross
    #[arg(long, value_name = "PATTERN")]
    spawn: Option<SpawnPattern>,
    /// Grid size as WIDTHxHEIGHT
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    size: Option<(usize, usize)>,
    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,
    /// Generations to run
    #[arg(long)]
    generations: Option<u64>,
    /// Generations per second (0 = unpaced)
    #[arg(long)]
    speed: Option<u32>,
    /// Seed for random spawns
    #[arg(long, value_parser = clap::value_parser!(u64).range(..=MAX_SEED))]
    seed: Option<u64>,
    /// Directory to write PNG frames into
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,
    /// Export every Nth generation
    #[arg(long, value_name = "N")]
    export_every: Option<u64>,
    /// Write the effective configuration to this path and continue
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,
    /// Print the available presets and exit
    #[arg(long)]
    list_presets: bool,
}

impl Args {
    /// Applies every given option on top of `config`.
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(rule) = &self.rule {
            config.rule.clone_from(rule);
        }
        if let Some(preset) = self.preset {
            config.preset = preset;
            if self.rule.is_none() {
                config.rule.clear();
            }
        }
        if let Some(spawn) = self.spawn {
            config.spawn = Some(spawn);
        }
        if let Some((width, height)) = self.size {
            config.width = width;
            config.height = height;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = Some(dir.clone());
        }
        if let Some(every) = self.export_every {
            config.export_every = every;
        }
    }
}

/// Parses `WIDTHxHEIGHT`.
fn parse_size(text: &str) -> Result<(usize, usize), String> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{text}'"))?;
    let width = width
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{width}': {e}"))?;
    let height = height
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{height}': {e}"))?;
    Ok((width, height))
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("afterglow=info".parse()?))
        .init();

    let args = Args::parse();

    if args.list_presets {
        for preset in Preset::ALL {
            println!(
                "{:<18} {:<14} spawn: {}",
                preset.name(),
                preset.rule_text(),
                preset.spawn()
            );
        }
        return Ok(());
    }

    info!("Afterglow starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load_from(&args.config);
    args.apply(&mut config);
    config.validate();

    if let Some(path) = &args.save_config {
        config
            .save_to(path)
            .with_context(|| format!("failed to save config to {}", path.display()))?;
    }

    let report = app::run(&config)?;
    info!(
        "Finished after {} generations with {} live cells",
        report.generations, report.live_cells
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("640x480"), Ok((640, 480)));
        assert_eq!(parse_size("32X16"), Ok((32, 16)));
        assert!(parse_size("640").is_err());
        assert!(parse_size("ax4").is_err());
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "afterglow",
            "--preset",
            "cube_fractal",
            "--spawn",
            "cross",
            "--size",
            "64x32",
            "--workers",
            "0",
        ]);
        let mut config = EngineConfig {
            rule: "2,3/3/1/M".to_string(),
            ..EngineConfig::default()
        };
        args.apply(&mut config);
        config.validate();

        assert_eq!(config.preset, Preset::CubeFractal);
        assert!(config.rule.is_empty());
        assert_eq!(config.spawn, Some(SpawnPattern::Cross));
        assert_eq!((config.width, config.height), (64, 32));
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_explicit_rule_wins_over_preset() {
        let args = Args::parse_from(["afterglow", "--rule", "0-8/1/1/N", "--preset", "diamond"]);
        let mut config = EngineConfig::default();
        args.apply(&mut config);
        assert_eq!(config.rule, "0-8/1/1/N");
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        assert!(Args::try_parse_from(["afterglow", "--preset", "seeds"]).is_err());
    }

    #[test]
    fn test_seed_must_fit_config_file() {
        let max = MAX_SEED.to_string();
        let args = Args::try_parse_from(["afterglow", "--seed", max.as_str()]).expect("max seed");
        assert_eq!(args.seed, Some(MAX_SEED));

        let over = (MAX_SEED + 1).to_string();
        assert!(Args::try_parse_from(["afterglow", "--seed", over.as_str()]).is_err());
    }
}
