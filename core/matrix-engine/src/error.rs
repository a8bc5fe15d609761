//! FILENAME: core/matrix-engine/src/error.rs

use thiserror::Error;

/// Internal invariant violations detected while reprojecting a matrix.
/// Tolerated inputs (no ordering, no value roles, no levels) are not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("row leaf spans {found} column group instances, expected at most {expected}")]
    InconsistentValueCount { expected: usize, found: usize },

    #[error("{count} measure header leaves are not a multiple of {value_sources} value sources")]
    ValueCountNotMultiple { count: usize, value_sources: usize },

    #[error("level source with select index {select_index:?} is missing from the ordering of role '{role}'")]
    MissingProjectedSource { role: String, select_index: Option<usize> },

    #[error("node at level {level} has {found} level values, expected {expected}")]
    LevelValueMismatch { level: usize, expected: usize, found: usize },
}
