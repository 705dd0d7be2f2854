//! Error types for hierarchy, zone, and enum misuse.

use thiserror::Error;

use crate::types::Identifier;

/// Configuration and logic errors raised by the core records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(Identifier),

    #[error("unknown asset: {0}")]
    UnknownAsset(Identifier),

    #[error("unknown weapon: {0}")]
    UnknownWeapon(Identifier),

    #[error("asset {0} cannot be its own commander")]
    SelfReference(Identifier),

    #[error("placing {sub} under {commander} would create a command cycle")]
    CommandCycle {
        commander: Identifier,
        sub: Identifier,
    },

    #[error("asset {asset} has no {resource} left to reserve")]
    ReadinessExhausted {
        asset: Identifier,
        resource: &'static str,
    },

    #[error("invalid zone '{name}': {reason}")]
    InvalidZone { name: String, reason: String },

    #[error("invalid assignment status code: {0}")]
    InvalidStatusCode(u8),

    #[error("invalid assignment status name: {0}")]
    InvalidStatusName(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
