//! Contracts for services implemented outside the decision layer.
//!
//! Both traits are synchronous, in-process calls. Implementations must be
//! pure with respect to the arguments so that assessments are reproducible.

use crate::track::Track;
use crate::types::Position;
use crate::weapon::WeaponRecord;

/// Delays between allocation and the weapon leaving the rail.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InterceptDelays {
    /// Time for the assignment to reach and be accepted by the weapon (s).
    pub assignment_delay_secs: f64,
    /// Expected time from acceptance to launch (s).
    pub execution_delay_secs: f64,
}

impl InterceptDelays {
    pub fn total(&self) -> f64 {
        self.assignment_delay_secs + self.execution_delay_secs
    }
}

/// Answer from an [`InterceptCalculator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptSolution {
    pub feasible: bool,
    /// Estimated probability of kill in [0, 1].
    pub pk: f64,
    /// Seconds from now until intercept, delays included.
    pub time_to_intercept: f64,
    pub predicted_point: Position,
    pub max_range_m: f64,
}

impl InterceptSolution {
    pub fn infeasible(predicted_point: Position, max_range_m: f64) -> Self {
        Self {
            feasible: false,
            pk: 0.0,
            time_to_intercept: f64::INFINITY,
            predicted_point,
            max_range_m,
        }
    }
}

/// Kinematic feasibility of a weapon against a track.
pub trait InterceptCalculator {
    fn can_intercept(
        &self,
        weapon: &WeaponRecord,
        track: &Track,
        delays: &InterceptDelays,
    ) -> InterceptSolution;
}

/// Terrain masking between two points.
pub trait TerrainQuery {
    fn is_line_of_sight_masked(&self, observer: &Position, target: &Position) -> bool;
}

/// Terrain query for a featureless earth. Nothing is ever masked.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTerrain;

impl TerrainQuery for OpenTerrain {
    fn is_line_of_sight_masked(&self, _observer: &Position, _target: &Position) -> bool {
        false
    }
}
