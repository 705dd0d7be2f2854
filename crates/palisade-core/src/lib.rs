//! Core types and definitions for the PALISADE air-defense decision layer.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identifiers, positions, tracks, zones, the asset hierarchy arena,
//! weapon records, and the external service contracts (intercept
//! calculation, terrain masking). It contains no engagement logic.

pub mod asset;
pub mod constants;
pub mod enums;
pub mod error;
pub mod geometry;
pub mod services;
pub mod track;
pub mod types;
pub mod weapon;
pub mod zone;

pub use asset::{AssetMap, AssetRecord};
pub use error::{CoreError, CoreResult};
pub use track::Track;
pub use types::{GeoPoint, Identifier, Position};
pub use weapon::{WeaponCategory, WeaponRecord};
pub use zone::{Zone, ZoneShape, ZoneTypeMask};

#[cfg(test)]
mod tests;
