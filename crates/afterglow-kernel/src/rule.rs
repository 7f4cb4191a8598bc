//! Rule grammar and parser.
//!
//! A rule is written `SURVIVE/BORN/STATES/MODE`:
//!
//! - `SURVIVE`, `BORN`: comma-separated neighbor counts, each a single
//!   integer or an inclusive range `a-b`
//! - `STATES`: the maximum cell state (`3` means states `0..=3`)
//! - `MODE`: `M` (Moore, 8 neighbors) or `N` (von Neumann, 4 neighbors)
//!
//! `"2,3/3/1/M"` is the classic two-state life rule; `"0-4/1-3/3/M"` has
//! three decaying afterglow states below the live state.

use std::fmt;
use std::str::FromStr;

use afterglow_common::{RuleField, RuleParseError};
use serde::{Deserialize, Serialize};

/// Neighbor offsets examined in von Neumann mode: north, south, west, east.
const VON_NEUMANN_OFFSETS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Neighbor offsets examined in Moore mode: the orthogonals, then the diagonals.
const MOORE_OFFSETS: [(i64, i64); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Adjacency used when counting neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeighborhoodMode {
    /// 8 neighbors: orthogonal and diagonal
    Moore,
    /// 4 orthogonal neighbors
    VonNeumann,
}

impl NeighborhoodMode {
    /// Number of neighbors this mode examines.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Moore => MOORE_OFFSETS.len(),
            Self::VonNeumann => VON_NEUMANN_OFFSETS.len(),
        }
    }

    /// `(dx, dy)` offsets of every neighbor.
    #[must_use]
    pub const fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Self::Moore => &MOORE_OFFSETS,
            Self::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }

    /// Rule-text symbol for this mode.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Moore => 'M',
            Self::VonNeumann => 'N',
        }
    }
}

/// A set of neighbor counts, stored as a 256-bit mask.
///
/// Counts above the neighborhood size are kept (so the rule text
/// round-trips) but can never match during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CountSet {
    bits: [u64; 4],
}

impl CountSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: [0; 4] }
    }

    /// Adds a count.
    pub fn insert(&mut self, count: u8) {
        self.bits[(count >> 6) as usize] |= 1 << (count & 63);
    }

    /// Checks membership.
    #[must_use]
    #[inline]
    pub const fn contains(&self, count: u8) -> bool {
        self.bits[(count >> 6) as usize] & (1 << (count & 63)) != 0
    }

    /// Number of distinct counts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&word| word == 0)
    }

    /// Iterates the counts in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&count| self.contains(count))
    }

    /// Renders the set as rule-field text, collapsing runs of three or more
    /// consecutive counts into `a-b`.
    #[must_use]
    pub fn to_field_text(&self) -> String {
        let values: Vec<u8> = self.iter().collect();
        let mut parts = Vec::new();
        let mut i = 0;
        while i < values.len() {
            let start = values[i];
            let mut end = start;
            while i + 1 < values.len() && values[i + 1] == end + 1 {
                end = values[i + 1];
                i += 1;
            }
            match end - start {
                0 => parts.push(start.to_string()),
                1 => {
                    parts.push(start.to_string());
                    parts.push(end.to_string());
                },
                _ => parts.push(format!("{start}-{end}")),
            }
            i += 1;
        }
        parts.join(",")
    }
}

impl FromIterator<u8> for CountSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = Self::new();
        for count in iter {
            set.insert(count);
        }
        set
    }
}

/// A validated transition rule.
///
/// Immutable once parsed. Cell states range over `0..=max_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    survive: CountSet,
    born: CountSet,
    max_state: u8,
    mode: NeighborhoodMode,
    source: String,
}

impl RuleSpec {
    /// Builds a rule directly from its parts. `max_state` is clamped to at
    /// least 1 and the source text is the canonical rendering.
    ///
    /// Both count sets must be non-empty, since rule text has no way to
    /// write an empty field.
    pub fn new(
        survive: CountSet,
        born: CountSet,
        max_state: u8,
        mode: NeighborhoodMode,
    ) -> Result<Self, RuleParseError> {
        if survive.is_empty() {
            return Err(RuleParseError::EmptyCounts {
                field: RuleField::Survive,
            });
        }
        if born.is_empty() {
            return Err(RuleParseError::EmptyCounts {
                field: RuleField::Born,
            });
        }

        Ok(Self::from_counts(survive, born, max_state, mode))
    }

    /// Builds a rule from count sets already known to be non-empty.
    pub(crate) fn from_counts(
        survive: CountSet,
        born: CountSet,
        max_state: u8,
        mode: NeighborhoodMode,
    ) -> Self {
        debug_assert!(!survive.is_empty() && !born.is_empty());
        let mut rule = Self {
            survive,
            born,
            max_state: max_state.max(1),
            mode,
            source: String::new(),
        };
        rule.source = rule.canonical();
        rule
    }

    /// Parses rule text. See the module docs for the grammar.
    pub fn parse(text: &str) -> Result<Self, RuleParseError> {
        parse(text)
    }

    /// Counts at which a maximal cell stays maximal.
    #[must_use]
    pub const fn survive(&self) -> &CountSet {
        &self.survive
    }

    /// Counts at which a zero cell becomes maximal.
    #[must_use]
    pub const fn born(&self) -> &CountSet {
        &self.born
    }

    /// Highest cell state (the "live" state).
    #[must_use]
    pub const fn max_state(&self) -> u8 {
        self.max_state
    }

    /// Neighborhood used for counting.
    #[must_use]
    pub const fn mode(&self) -> NeighborhoodMode {
        self.mode
    }

    /// The text this rule was parsed from.
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source
    }

    /// Normalized rule text (sorted counts, runs collapsed, upper-case mode).
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.survive.to_field_text(),
            self.born.to_field_text(),
            self.max_state,
            self.mode.symbol()
        )
    }

    /// Compares the rule semantics, ignoring the retained source text.
    #[must_use]
    pub fn same_rule(&self, other: &Self) -> bool {
        self.survive == other.survive
            && self.born == other.born
            && self.max_state == other.max_state
            && self.mode == other.mode
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for RuleSpec {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parses `SURVIVE/BORN/STATES/MODE` rule text.
///
/// Fields and tokens are whitespace-trimmed. Fields past the fourth are
/// ignored. Nothing is produced unless the whole text is valid.
pub fn parse(text: &str) -> Result<RuleSpec, RuleParseError> {
    if text.trim().is_empty() {
        return Err(RuleParseError::Empty);
    }

    let fields: Vec<&str> = text.split('/').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(RuleParseError::MissingFields {
            found: fields.len(),
        });
    }

    let survive = parse_counts(fields[0], RuleField::Survive)?;
    let born = parse_counts(fields[1], RuleField::Born)?;

    let max_state = match fields[2].parse::<u8>() {
        Ok(states) if states >= 1 => states,
        _ => {
            return Err(RuleParseError::InvalidStates {
                token: fields[2].to_string(),
            })
        },
    };

    let mode = match fields[3].to_ascii_lowercase().as_str() {
        "m" => NeighborhoodMode::Moore,
        "n" => NeighborhoodMode::VonNeumann,
        _ => {
            return Err(RuleParseError::InvalidMode {
                token: fields[3].to_string(),
            })
        },
    };

    Ok(RuleSpec {
        survive,
        born,
        max_state,
        mode,
        source: text.to_string(),
    })
}

/// Parses one comma-separated count field.
fn parse_counts(field_text: &str, field: RuleField) -> Result<CountSet, RuleParseError> {
    let mut set = CountSet::new();
    for token in field_text.split(',').map(str::trim) {
        if let Ok(count) = token.parse::<u8>() {
            set.insert(count);
            continue;
        }

        let Some((low, high)) = token.split_once('-') else {
            return Err(RuleParseError::InvalidInteger {
                field,
                token: token.to_string(),
            });
        };

        let invalid_range = || RuleParseError::InvalidRange {
            field,
            token: token.to_string(),
        };
        let low = low.trim().parse::<u8>().map_err(|_| invalid_range())?;
        let high = high.trim().parse::<u8>().map_err(|_| invalid_range())?;
        if low > high {
            return Err(invalid_range());
        }
        for count in low..=high {
            set.insert(count);
        }
    }
    Ok(set)
}
