//! Engagement configuration. Already-parsed form; JSON is the reference encoding.

use serde::{Deserialize, Serialize};

use palisade_core::constants::{DEFAULT_MAX_FIRING_TIME_SECS, DEFAULT_STALE_ASSET_TIME_SECS};
use palisade_core::services::InterceptDelays;

use crate::error::{EngageError, EngageResult};

/// Weights of the composite pairing score. A term counts only when its
/// weight is positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub target_priority: f64,
    pub weapon_type: f64,
    pub weapon_subtype: f64,
    /// Reward for intercepting well inside maximum range.
    pub range: f64,
    /// Reward for intercepting sooner than the threat would close unopposed.
    pub time_saved: f64,
    pub pk: f64,
    /// Reward for lightly loaded assets.
    pub workload: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            target_priority: 1.0,
            weapon_type: 1.0,
            weapon_subtype: 1.0,
            range: 1.0,
            time_saved: 1.0,
            pk: 1.0,
            workload: 1.0,
        }
    }
}

impl ScoringWeights {
    fn all(&self) -> [f64; 7] {
        [
            self.target_priority,
            self.weapon_type,
            self.weapon_subtype,
            self.range,
            self.time_saved,
            self.pk,
            self.workload,
        ]
    }
}

/// How threats are matched to weapons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStrategy {
    /// Each threat independently takes its fastest feasible intercept.
    #[default]
    MinTimeToIntercept,
    /// Threats and weapons are matched jointly to minimize total intercept time.
    Optimal,
}

/// Engagement assessment settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub weights: ScoringWeights,
    /// Time for an assignment to reach the weapon (s).
    pub assignment_delay_secs: f64,
    /// Time from acceptance to launch (s).
    pub expected_execution_delay_secs: f64,
    /// Subordinates silent for longer than this are not assigned to (s).
    pub stale_asset_time_secs: f64,
    /// Assignments without a salvo after this long are cancelled (s).
    pub max_firing_time_secs: f64,
    pub compute_intercepts: bool,
    /// Require line of sight from ground weapons to the threat at launch.
    pub check_terrain_at_launch: bool,
    /// Require the predicted intercept point to lie in one of the weapon's zones.
    pub require_zone: bool,
    /// Report closest partial matches when no preference row applies.
    pub diagnostic_mode: bool,
    pub strategy: AllocationStrategy,
    /// Concurrent active assignments allowed per threat.
    pub max_assignments_per_track: u32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            assignment_delay_secs: 2.0,
            expected_execution_delay_secs: 5.0,
            stale_asset_time_secs: DEFAULT_STALE_ASSET_TIME_SECS,
            max_firing_time_secs: DEFAULT_MAX_FIRING_TIME_SECS,
            compute_intercepts: true,
            check_terrain_at_launch: true,
            require_zone: false,
            diagnostic_mode: true,
            strategy: AllocationStrategy::MinTimeToIntercept,
            max_assignments_per_track: 1,
        }
    }
}

impl EngagementConfig {
    pub fn from_json(json: &str) -> EngageResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngageResult<()> {
        let times = [
            ("assignment_delay_secs", self.assignment_delay_secs),
            ("expected_execution_delay_secs", self.expected_execution_delay_secs),
            ("stale_asset_time_secs", self.stale_asset_time_secs),
            ("max_firing_time_secs", self.max_firing_time_secs),
        ];
        for (name, value) in times {
            if !value.is_finite() || value < 0.0 {
                return Err(EngageError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.weights.all().iter().any(|w| !w.is_finite()) {
            return Err(EngageError::InvalidConfig(
                "scoring weights must be finite".to_string(),
            ));
        }
        if self.max_assignments_per_track == 0 {
            return Err(EngageError::InvalidConfig(
                "max_assignments_per_track must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn delays(&self) -> InterceptDelays {
        InterceptDelays {
            assignment_delay_secs: self.assignment_delay_secs,
            execution_delay_secs: self.expected_execution_delay_secs,
        }
    }
}
