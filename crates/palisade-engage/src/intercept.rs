//! Closed-form collision-course intercept calculator.
//!
//! The threat is advanced to the launch time (track time plus the
//! assignment and execution delays), then the interceptor flies a straight
//! collision course at constant speed. Target velocity is split into a
//! component along the line of sight and one across it; the interceptor
//! must match the crossing component, and whatever speed remains closes
//! the range.

use glam::DVec3;

use palisade_core::constants::MIN_CLOSING_SPEED;
use palisade_core::services::{InterceptCalculator, InterceptDelays, InterceptSolution};
use palisade_core::{Position, Track, WeaponRecord};

/// Fraction of nominal Pk lost at maximum range.
pub const DEFAULT_PK_FALLOFF: f64 = 0.3;

/// Reference [`InterceptCalculator`] for constant-velocity threats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicInterceptCalculator {
    pub pk_falloff: f64,
}

impl Default for KinematicInterceptCalculator {
    fn default() -> Self {
        Self {
            pk_falloff: DEFAULT_PK_FALLOFF,
        }
    }
}

impl KinematicInterceptCalculator {
    /// Probability of kill at `range_m`, falling linearly to
    /// `1 - pk_falloff` of nominal at maximum range.
    pub fn pk_at_range(&self, weapon: &WeaponRecord, range_m: f64) -> f64 {
        let frac = if weapon.max_range_m > 0.0 {
            (range_m / weapon.max_range_m).clamp(0.0, 1.0)
        } else {
            1.0
        };
        (weapon.nominal_pk * (1.0 - self.pk_falloff * frac)).clamp(0.0, 1.0)
    }
}

/// Fly-out time from `launch_point` to a target at `target_pos` moving with
/// `target_vel`, or `None` when the interceptor can never catch it.
pub fn calculate_intercept_time(
    launch_point: DVec3,
    target_pos: DVec3,
    target_vel: DVec3,
    interceptor_speed: f64,
) -> Option<f64> {
    let los = target_pos - launch_point;
    let distance = los.length();
    if distance < f64::EPSILON {
        return Some(0.0);
    }
    let u = los / distance;

    // Positive when the target moves away from the launcher
    let along = target_vel.dot(u);
    let across = (target_vel - u * along).length();

    let radicand = interceptor_speed * interceptor_speed - across * across;
    if radicand <= 0.0 {
        return None;
    }
    let closing = radicand.sqrt() - along;
    if closing <= MIN_CLOSING_SPEED {
        return None;
    }
    Some(distance / closing)
}

impl InterceptCalculator for KinematicInterceptCalculator {
    fn can_intercept(
        &self,
        weapon: &WeaponRecord,
        track: &Track,
        delays: &InterceptDelays,
    ) -> InterceptSolution {
        // Step 1: threat position when the weapon leaves the rail
        let launch_time = track.update_time + delays.total();
        let at_launch = track.extrapolated(launch_time);

        // Step 2: collision course from the launcher
        let Some(flight) = calculate_intercept_time(
            weapon.position.ecef(),
            at_launch.position.ecef(),
            track.velocity,
            weapon.munition_speed_mps,
        ) else {
            return InterceptSolution::infeasible(at_launch.position, weapon.max_range_m);
        };

        // Step 3: range gates
        let predicted: Position = track.extrapolated(launch_time + flight).position;
        let range = weapon.position.slant_range_to(&predicted);
        if range > weapon.max_range_m || range < weapon.category.min_range_m() {
            return InterceptSolution::infeasible(predicted, weapon.max_range_m);
        }

        InterceptSolution {
            feasible: true,
            pk: self.pk_at_range(weapon, range),
            time_to_intercept: delays.total() + flight,
            predicted_point: predicted,
            max_range_m: weapon.max_range_m,
        }
    }
}
