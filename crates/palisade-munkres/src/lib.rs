//! Optimal assignment for PALISADE.
//!
//! A minimum-cost bipartite matching engine (the Hungarian method) over a
//! dense, possibly rectangular cost matrix. Pure functions on plain data;
//! nothing here knows about weapons or threats.

pub mod error;
pub mod solver;

pub use error::{MunkresError, MunkresResult};
pub use solver::{solve, Assignment};

#[cfg(test)]
mod tests;
