//! Evaluation and scoring of one (weapon, threat) pair.
//!
//! Feasibility failures are recorded on the pairing and never returned as
//! errors. Checks run in a fixed order and the first failure skips the rest.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use palisade_core::constants::{MAX_SCORE, TARGET_PRIORITY_CEILING};
use palisade_core::enums::ZoneType;
use palisade_core::services::{InterceptCalculator, TerrainQuery};
use palisade_core::{AssetRecord, Identifier, Position, WeaponRecord, ZoneTypeMask};

use crate::config::{EngagementConfig, ScoringWeights};
use crate::exclusion::ExclusionList;
use crate::threat::Threat;
use crate::weapon_table::WeaponTable;

/// Why a pairing cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairingFailure {
    NoWeaponPreference,
    ExcludedWeaponType,
    ExcludedWeaponSubtype,
    UnitExcluded,
    NoMunitions,
    NoFireChannels,
    NoAssignmentSlots,
    NoInterceptSolution,
    MinPkNotMet,
    OutsideWeaponZone,
    NoLineOfSight,
}

impl PairingFailure {
    pub fn reason(self) -> &'static str {
        match self {
            PairingFailure::NoWeaponPreference => "no weapon preference",
            PairingFailure::ExcludedWeaponType => "excluded weapon type",
            PairingFailure::ExcludedWeaponSubtype => "excluded weapon subtype",
            PairingFailure::UnitExcluded => "unit is excluded",
            PairingFailure::NoMunitions => "no available munitions",
            PairingFailure::NoFireChannels => "no available fire channels",
            PairingFailure::NoAssignmentSlots => "no open assignment slots",
            PairingFailure::NoInterceptSolution => "no intercept solution",
            PairingFailure::MinPkNotMet => "min PK not met",
            PairingFailure::OutsideWeaponZone => "predicted intercept point not in weapon's zone",
            PairingFailure::NoLineOfSight => "no line of sight at launch",
        }
    }

    /// Counter shortages that clear once other assignments end.
    pub fn is_readiness(self) -> bool {
        matches!(
            self,
            PairingFailure::NoMunitions
                | PairingFailure::NoFireChannels
                | PairingFailure::NoAssignmentSlots
        )
    }
}

impl fmt::Display for PairingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Result of evaluating one weapon against one threat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponPairing {
    pub weapon_id: Identifier,
    pub owner_id: Identifier,
    pub threat_id: Identifier,
    /// Threat rank, 1 most urgent.
    pub threat_priority: u32,
    /// Index of the matched preference row.
    pub row_index: Option<usize>,
    pub weapon_type_priority: u32,
    /// Priority from the row's subtype list, if the weapon's system type is listed.
    pub weapon_subtype_priority: Option<u32>,
    pub min_pk: f64,
    pub failure: Option<PairingFailure>,
    pub can_intercept: bool,
    pub pk: f64,
    /// Seconds from now to intercept.
    pub time_to_intercept: f64,
    pub predicted_point: Option<Position>,
    pub max_range_m: f64,
    /// Slant range from the weapon to the predicted intercept point.
    pub intercept_range_m: f64,
    /// Time for the threat to reach the weapon flying straight at it.
    pub naive_closing_time_s: f64,
    pub workload: f64,
    pub zone_types: ZoneTypeMask,
    /// Composite score in [0, 10]; 0 means unusable.
    pub score: f64,
}

impl WeaponPairing {
    fn new(owner: &AssetRecord, weapon: &WeaponRecord, threat: &Threat) -> Self {
        Self {
            weapon_id: weapon.id,
            owner_id: owner.id,
            threat_id: threat.id(),
            threat_priority: threat.rank,
            row_index: None,
            weapon_type_priority: 0,
            weapon_subtype_priority: None,
            min_pk: 0.0,
            failure: None,
            can_intercept: false,
            pk: 0.0,
            time_to_intercept: f64::INFINITY,
            predicted_point: None,
            max_range_m: weapon.max_range_m,
            intercept_range_m: f64::INFINITY,
            naive_closing_time_s: f64::INFINITY,
            workload: 0.0,
            zone_types: ZoneTypeMask::EMPTY,
            score: 0.0,
        }
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Human-readable failure reason.
    pub fn reason(&self) -> Option<&'static str> {
        self.failure.map(PairingFailure::reason)
    }

    /// Usable for allocation.
    pub fn eligible(&self) -> bool {
        !self.failed() && self.can_intercept
    }

    fn fail(mut self, failure: PairingFailure) -> Self {
        self.failure = Some(failure);
        self.score = 0.0;
        debug!(
            threat = %self.threat_id,
            weapon = %self.weapon_id,
            reason = failure.reason(),
            "pairing failed"
        );
        self
    }
}

/// Shared inputs for evaluating every pairing of one assessment.
#[derive(Clone, Copy)]
pub struct PairingContext<'a> {
    pub table: &'a WeaponTable,
    pub intercept: &'a dyn InterceptCalculator,
    pub terrain: &'a dyn TerrainQuery,
    pub config: &'a EngagementConfig,
    pub exclusions: &'a ExclusionList,
    /// Assessment time (seconds).
    pub now: f64,
}

/// Evaluate `weapon` (owned by `owner`) against `threat`.
pub fn evaluate(
    owner: &AssetRecord,
    weapon: &WeaponRecord,
    threat: &Threat,
    ctx: &PairingContext,
) -> WeaponPairing {
    let mut pairing = WeaponPairing::new(owner, weapon, threat);
    let track = if threat.track.update_time < ctx.now {
        threat.track.extrapolated(ctx.now)
    } else {
        threat.track.clone()
    };

    // Step 1: preference row and weapon category priority
    let Some((row_index, row)) = ctx.table.lookup_track(&track) else {
        return pairing.fail(PairingFailure::NoWeaponPreference);
    };
    pairing.row_index = Some(row_index);
    pairing.min_pk = row.min_pk_for(&weapon.system_type);
    pairing.weapon_type_priority = row.category_priorities.get(weapon.category.kind());
    if pairing.weapon_type_priority == 0 {
        return pairing.fail(PairingFailure::ExcludedWeaponType);
    }

    // Step 2: subtype preference
    if let Some(sub) = row.subtype_preference(&weapon.system_type) {
        pairing.weapon_subtype_priority = Some(sub.priority);
        if sub.priority == 0 {
            return pairing.fail(PairingFailure::ExcludedWeaponSubtype);
        }
    }

    if ctx.exclusions.is_excluded(threat.id(), owner.id) {
        return pairing.fail(PairingFailure::UnitExcluded);
    }

    // Step 3: readiness
    if !weapon.has_munitions() {
        return pairing.fail(PairingFailure::NoMunitions);
    }
    if !weapon.has_fire_channels() {
        return pairing.fail(PairingFailure::NoFireChannels);
    }
    if !owner.has_open_assignment_slot() {
        return pairing.fail(PairingFailure::NoAssignmentSlots);
    }

    // Step 4: workload
    pairing.workload = owner.workload();

    let current_range = weapon.position.slant_range_to(&track.position);
    let speed = track.speed();
    if speed > 0.0 {
        pairing.naive_closing_time_s = current_range / speed;
    }

    // Step 5: intercept
    let delays = ctx.config.delays();
    if ctx.config.compute_intercepts {
        let solution = ctx.intercept.can_intercept(weapon, &track, &delays);
        pairing.predicted_point = Some(solution.predicted_point);
        pairing.max_range_m = solution.max_range_m;
        if !solution.feasible {
            return pairing.fail(PairingFailure::NoInterceptSolution);
        }
        pairing.can_intercept = true;
        pairing.pk = solution.pk;
        pairing.time_to_intercept = solution.time_to_intercept;
        pairing.intercept_range_m = weapon.position.slant_range_to(&solution.predicted_point);
        if pairing.pk < pairing.min_pk {
            pairing.can_intercept = false;
            return pairing.fail(PairingFailure::MinPkNotMet);
        }
    } else {
        // Without a solution the current position stands in for the intercept point
        pairing.can_intercept = true;
        pairing.pk = weapon.nominal_pk;
        pairing.predicted_point = Some(track.position);
        pairing.intercept_range_m = current_range;
        pairing.time_to_intercept = if weapon.munition_speed_mps > 0.0 {
            delays.total() + current_range / weapon.munition_speed_mps
        } else {
            f64::INFINITY
        };
    }

    // Zone classification of the predicted intercept point
    let predicted = pairing.predicted_point.unwrap_or(track.position);
    pairing.zone_types = ZoneTypeMask::containing(&weapon.zones, &predicted, ZoneType::Other);
    if ctx.config.require_zone
        && !weapon.zones.is_empty()
        && !weapon.zones.iter().any(|z| z.contains(&predicted))
    {
        return pairing.fail(PairingFailure::OutsideWeaponZone);
    }

    // Step 6: terrain at launch
    if ctx.config.check_terrain_at_launch && weapon.category.is_ground_based() {
        let at_launch = track.extrapolated(ctx.now.max(track.update_time) + delays.total());
        if ctx
            .terrain
            .is_line_of_sight_masked(&weapon.position, &at_launch.position)
        {
            return pairing.fail(PairingFailure::NoLineOfSight);
        }
    }

    pairing.score = compute_score(&pairing, &ctx.config.weights);
    debug!(
        threat = %pairing.threat_id,
        weapon = %pairing.weapon_id,
        score = pairing.score,
        tti = pairing.time_to_intercept,
        pk = pairing.pk,
        "pairing evaluated"
    );
    pairing
}

/// Weighted composite score in [0, 10].
///
/// Every term is itself in [0, 10]. Terms with a non-positive weight are
/// left out, and the weighted sum is divided by the sum of active weights.
pub fn compute_score(pairing: &WeaponPairing, weights: &ScoringWeights) -> f64 {
    if !pairing.eligible() {
        return 0.0;
    }

    let target = TARGET_PRIORITY_CEILING
        .saturating_sub(pairing.threat_priority.max(1))
        .min(10) as f64;
    let weapon_type = pairing.weapon_type_priority.min(10) as f64;
    let weapon_subtype = pairing.weapon_subtype_priority.unwrap_or(0).min(10) as f64;

    let range = if pairing.max_range_m > 0.0 && pairing.intercept_range_m.is_finite() {
        MAX_SCORE * (1.0 - (pairing.intercept_range_m / pairing.max_range_m).clamp(0.0, 1.0))
    } else {
        0.0
    };

    let naive = pairing.naive_closing_time_s;
    let time_saved = if naive.is_finite() && naive > 0.0 && pairing.time_to_intercept.is_finite() {
        MAX_SCORE * ((naive - pairing.time_to_intercept) / naive).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let pk = MAX_SCORE * pairing.pk.clamp(0.0, 1.0);
    let workload = MAX_SCORE * (1.0 - pairing.workload.clamp(0.0, 1.0));

    let terms = [
        (weights.target_priority, target),
        (weights.weapon_type, weapon_type),
        (weights.weapon_subtype, weapon_subtype),
        (weights.range, range),
        (weights.time_saved, time_saved),
        (weights.pk, pk),
        (weights.workload, workload),
    ];

    let (sum, total_weight) = terms
        .iter()
        .filter(|(w, _)| *w > 0.0)
        .fold((0.0, 0.0), |(sum, total), (w, v)| (sum + w * v, total + w));
    if total_weight <= 0.0 {
        return 0.0;
    }
    (sum / total_weight).clamp(0.0, MAX_SCORE)
}
