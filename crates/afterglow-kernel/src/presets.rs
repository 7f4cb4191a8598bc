//! Named rule presets with their customary spawn pattern.

use std::fmt;
use std::str::FromStr;

use afterglow_common::AfterglowError;
use serde::{Deserialize, Serialize};

use crate::grid::SpawnPattern;
use crate::rule::{CountSet, NeighborhoodMode, RuleSpec};

/// Well-known rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Two-state birth/survival life, `2,3/3/1/M`
    ConwaysLife,
    /// `0-8/1/1/N`
    DiamondFractal,
    /// `0-8/1-8/1/N`
    Diamond,
    /// `0/1-8/100/N`, long decay trails
    BreathingDiamond,
    /// `0-8/1/1/M`
    CubeFractal,
    /// `0-4/1-3/3/M`, four states with afterglow
    #[default]
    Afterglow,
}

impl Preset {
    /// Every preset, in display order.
    pub const ALL: [Self; 6] = [
        Self::ConwaysLife,
        Self::DiamondFractal,
        Self::Diamond,
        Self::BreathingDiamond,
        Self::CubeFractal,
        Self::Afterglow,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConwaysLife => "conways_life",
            Self::DiamondFractal => "diamond_fractal",
            Self::Diamond => "diamond",
            Self::BreathingDiamond => "breathing_diamond",
            Self::CubeFractal => "cube_fractal",
            Self::Afterglow => "afterglow",
        }
    }

    /// Rule text in `SURVIVE/BORN/STATES/MODE` form.
    #[must_use]
    pub const fn rule_text(self) -> &'static str {
        match self {
            Self::ConwaysLife => "2,3/3/1/M",
            Self::DiamondFractal => "0-8/1/1/N",
            Self::Diamond => "0-8/1-8/1/N",
            Self::BreathingDiamond => "0/1-8/100/N",
            Self::CubeFractal => "0-8/1/1/M",
            Self::Afterglow => "0-4/1-3/3/M",
        }
    }

    /// Spawn pattern the preset is usually started from.
    #[must_use]
    pub const fn spawn(self) -> SpawnPattern {
        match self {
            Self::ConwaysLife => SpawnPattern::Random,
            _ => SpawnPattern::Middle,
        }
    }

    /// Builds the preset's rule.
    #[must_use]
    pub fn rule(self) -> RuleSpec {
        let (survive, born, max_state, mode): (CountSet, CountSet, u8, NeighborhoodMode) =
            match self {
                Self::ConwaysLife => (
                    [2, 3].into_iter().collect(),
                    [3].into_iter().collect(),
                    1,
                    NeighborhoodMode::Moore,
                ),
                Self::DiamondFractal => (
                    (0..=8).collect(),
                    [1].into_iter().collect(),
                    1,
                    NeighborhoodMode::VonNeumann,
                ),
                Self::Diamond => (
                    (0..=8).collect(),
                    (1..=8).collect(),
                    1,
                    NeighborhoodMode::VonNeumann,
                ),
                Self::BreathingDiamond => (
                    [0].into_iter().collect(),
                    (1..=8).collect(),
                    100,
                    NeighborhoodMode::VonNeumann,
                ),
                Self::CubeFractal => (
                    (0..=8).collect(),
                    [1].into_iter().collect(),
                    1,
                    NeighborhoodMode::Moore,
                ),
                Self::Afterglow => (
                    (0..=4).collect(),
                    (1..=3).collect(),
                    3,
                    NeighborhoodMode::Moore,
                ),
            };
        RuleSpec::from_counts(survive, born, max_state, mode)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = AfterglowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match name.as_str() {
            "conway" | "life" | "conways_life" | "game_of_life" => Ok(Self::ConwaysLife),
            _ => Self::ALL
                .into_iter()
                .find(|preset| preset.name() == name)
                .ok_or_else(|| AfterglowError::UnknownName {
                    kind: "preset",
                    name: s.to_string(),
                }),
        }
    }
}
