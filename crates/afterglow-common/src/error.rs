//! Error types for Afterglow.

use std::fmt;

use thiserror::Error;

/// Top-level error type for Afterglow operations.
#[derive(Debug, Error)]
pub enum AfterglowError {
    /// Rule text could not be parsed
    #[error("Rule error: {0}")]
    Rule(#[from] RuleParseError),

    /// Unknown preset or spawn pattern name
    #[error("Unknown {kind}: {name}")]
    UnknownName {
        /// What was being looked up ("preset", "spawn pattern")
        kind: &'static str,
        /// The name that did not match
        name: String,
    },

    /// Frame export failed
    #[error("Export error: {0}")]
    Export(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which neighbor-count field of a rule a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    /// First field: counts at which a maximal cell stays maximal
    Survive,
    /// Second field: counts at which a zero cell becomes maximal
    Born,
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Survive => f.write_str("survive"),
            Self::Born => f.write_str("born"),
        }
    }
}

/// Failure to parse a `SURVIVE/BORN/STATES/MODE` rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    /// The rule text contained no fields at all
    #[error("rule text is empty")]
    Empty,

    /// Fewer than four slash-separated fields
    #[error("expected 4 '/'-separated fields, found {found}")]
    MissingFields {
        /// Number of fields present
        found: usize,
    },

    /// A single-value token is not an integer in 0..=255
    #[error("invalid {field} value '{token}'")]
    InvalidInteger {
        /// Field containing the token
        field: RuleField,
        /// Offending token
        token: String,
    },

    /// A count field holds no counts at all
    #[error("{field} counts are empty")]
    EmptyCounts {
        /// Field with no counts
        field: RuleField,
    },

    /// A range token is not of the form `a-b` with integer bounds and `a <= b`
    #[error("invalid {field} range '{token}'")]
    InvalidRange {
        /// Field containing the token
        field: RuleField,
        /// Offending token
        token: String,
    },

    /// The states field is not an integer in 1..=255
    #[error("invalid state count '{token}'")]
    InvalidStates {
        /// Offending token
        token: String,
    },

    /// The mode field is neither `M` nor `N`
    #[error("invalid neighborhood mode '{token}' (expected M or N)")]
    InvalidMode {
        /// Offending token
        token: String,
    },
}

/// Result type alias for Afterglow operations.
pub type AfterglowResult<T> = Result<T, AfterglowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_messages() {
        let err = RuleParseError::MissingFields { found: 3 };
        assert_eq!(err.to_string(), "expected 4 '/'-separated fields, found 3");

        let err = RuleParseError::InvalidRange {
            field: RuleField::Born,
            token: "3-".to_string(),
        };
        assert_eq!(err.to_string(), "invalid born range '3-'");

        let err = RuleParseError::EmptyCounts {
            field: RuleField::Survive,
        };
        assert_eq!(err.to_string(), "survive counts are empty");
    }

    #[test]
    fn test_rule_error_converts() {
        let err: AfterglowError = RuleParseError::Empty.into();
        assert!(matches!(err, AfterglowError::Rule(RuleParseError::Empty)));
        assert_eq!(err.to_string(), "Rule error: rule text is empty");
    }
}
