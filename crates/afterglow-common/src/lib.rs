//! # Afterglow Common
//!
//! Shared types for the Afterglow multi-state automaton:
//! - Grid dimensions and toroidal coordinates
//! - Error taxonomy (rule parse errors, lookup and export failures)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
}

pub use prelude::*;
