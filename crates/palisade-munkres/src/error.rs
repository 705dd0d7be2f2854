//! Solver errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MunkresError {
    #[error("row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cost at ({row}, {col}) is not finite")]
    NonFiniteCost { row: usize, col: usize },

    /// Internal invariant violated. Indicates a solver defect, never bad input.
    #[error("solver reached an invalid state in step {0}")]
    BadStep(u8),
}

pub type MunkresResult<T> = Result<T, MunkresError>;
