//! Terrain masking for PALISADE.
//!
//! A geodetic heightmap grid and a stepped line-of-sight check with earth
//! curvature, exposed to the engagement layer through the core
//! `TerrainQuery` trait.

pub use palisade_core as core;

pub mod grid;
pub mod los;

pub use grid::{TerrainError, TerrainGrid, TerrainHeader};
pub use los::has_line_of_sight;
