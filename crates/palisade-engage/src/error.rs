//! Error types for fatal configuration and logic errors.
//!
//! Feasibility failures are not errors; they live on `WeaponPairing`.

use palisade_core::{CoreError, Identifier};
use palisade_munkres::MunkresError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngageError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("optimal allocation failed: {0}")]
    Munkres(#[from] MunkresError),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("weapon table row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("weapon table row {row} lists subtype '{system_type}' more than once")]
    DuplicateSubtype { row: usize, system_type: String },

    #[error("invalid engagement configuration: {0}")]
    InvalidConfig(String),

    #[error("no assignment of weapon {weapon} to track {track}")]
    UnknownAssignment { track: Identifier, weapon: Identifier },

    #[error("weapon {weapon} is already assigned to track {track}")]
    DuplicateAssignment { track: Identifier, weapon: Identifier },
}

/// Result type for engagement operations.
pub type EngageResult<T> = Result<T, EngageError>;
