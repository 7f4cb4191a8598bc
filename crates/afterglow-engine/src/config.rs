//! Engine configuration.
//!
//! Grid, rule, color and run-length settings for a headless run.
//! Configuration can be loaded from and saved to a TOML file; command-line
//! flags are applied on top.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use afterglow_common::RuleParseError;
use afterglow_kernel::{Preset, RuleSpec, SimulationSettings, SpawnPattern, DEFAULT_SPEED};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "afterglow.toml";

/// Largest seed the config file can store; TOML integers are signed 64-bit.
pub const MAX_SEED: u64 = i64::MAX as u64;

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Grid ===
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,

    // === Rule ===
    /// Rule text; when empty the preset is used
    pub rule: String,
    /// Named preset used when `rule` is empty
    pub preset: Preset,
    /// Spawn pattern (None = the preset's pattern, or middle for custom rules)
    pub spawn: Option<SpawnPattern>,

    // === Execution ===
    /// Worker threads
    pub workers: usize,
    /// Generations to run
    pub generations: u64,
    /// Generations per second (0 = as fast as possible)
    pub speed: u32,
    /// Random spawn seed (None = random)
    pub seed: Option<u64>,

    // === Colors ===
    /// Color of a cell at the maximum state
    pub cell_color: [f32; 3],
    /// Color of a cell at state 0
    pub background_color: [f32; 3],

    // === Export ===
    /// Directory for PNG frames (None = no export)
    pub export_dir: Option<PathBuf>,
    /// Export every Nth generation
    pub export_every: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,

            rule: String::new(),
            preset: Preset::default(),
            spawn: None,

            workers: 8,
            generations: 200,
            speed: 0,
            seed: None,

            cell_color: [1.0, 0.55, 0.1],
            background_color: [0.08, 0.08, 0.08],

            export_dir: None,
            export_every: 1,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp configuration values to usable ranges.
    pub fn validate(&mut self) {
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self.workers = self.workers.max(1);
        self.export_every = self.export_every.max(1);
        if let Some(seed) = self.seed {
            self.seed = Some(seed.min(MAX_SEED));
        }
    }

    /// The rule to run: the explicit rule text, or the preset's rule.
    pub fn resolve_rule(&self) -> Result<RuleSpec, RuleParseError> {
        if self.rule.trim().is_empty() {
            Ok(self.preset.rule())
        } else {
            RuleSpec::parse(&self.rule)
        }
    }

    /// The spawn pattern to seed with.
    #[must_use]
    pub fn resolve_spawn(&self) -> SpawnPattern {
        self.spawn.unwrap_or_else(|| {
            if self.rule.trim().is_empty() {
                self.preset.spawn()
            } else {
                SpawnPattern::default()
            }
        })
    }

    /// Kernel settings derived from this config.
    #[must_use]
    pub fn simulation_settings(&self) -> SimulationSettings {
        SimulationSettings {
            worker_count: self.workers,
            seed: self.seed,
            speed: if self.speed == 0 {
                DEFAULT_SPEED
            } else {
                self.speed
            },
        }
    }

    /// Cell color as a vector.
    #[must_use]
    pub fn cell_color(&self) -> Vec3 {
        Vec3::from_array(self.cell_color)
    }

    /// Background color as a vector.
    #[must_use]
    pub fn background_color(&self) -> Vec3 {
        Vec3::from_array(self.background_color)
    }
}
