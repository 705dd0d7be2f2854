//! Engagement assessment and threat allocation for one asset.
//!
//! `assess` builds every (ranked threat × ready weapon) pairing in the
//! asset's subtree. `allocate` then takes, per threat, the feasible pairing
//! with the smallest time to intercept. `allocate_optimal` instead solves
//! the threat/weapon matching jointly so no weapon is used twice.

use std::collections::BTreeSet;

use tracing::{info, warn};

use palisade_core::{AssetMap, CoreError, Identifier};
use palisade_munkres::solve;

use crate::error::EngageResult;
use crate::pairing::{evaluate, PairingContext, PairingFailure, WeaponPairing};
use crate::threat::Threat;
use crate::weapon_table::TargetQuery;

/// Flat pairing list produced by one assessment cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    pub asset: Identifier,
    pub time: f64,
    /// Assessed threats in rank order.
    pub threats: Vec<Identifier>,
    pub pairings: Vec<WeaponPairing>,
    /// Threats that matched no preference row.
    pub unpreferred: Vec<Identifier>,
}

impl Assessment {
    pub fn pairings_for(&self, threat: Identifier) -> impl Iterator<Item = &WeaponPairing> {
        self.pairings.iter().filter(move |p| p.threat_id == threat)
    }
}

/// One threat matched to one pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub threat_id: Identifier,
    pub pairing: WeaponPairing,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationOutcome {
    pub allocations: Vec<Allocation>,
    /// Assessed threats with no feasible weapon, in rank order.
    pub unallocated: Vec<Identifier>,
}

/// Threats ordered by (rank, id), skipping globally excluded tracks.
fn ranked_threats<'t>(threats: &'t [Threat], ctx: &PairingContext) -> Vec<&'t Threat> {
    let mut ranked: Vec<&Threat> = threats
        .iter()
        .filter(|t| !ctx.exclusions.is_globally_excluded(t.id()))
        .collect();
    ranked.sort_by_key(|t| (t.rank, t.id()));
    ranked
}

/// Evaluate every ranked threat against every ready weapon at or below `asset`.
pub fn assess(
    asset: Identifier,
    assets: &AssetMap,
    threats: &[Threat],
    ctx: &PairingContext,
) -> EngageResult<Assessment> {
    if !assets.contains(asset) {
        return Err(CoreError::UnknownAsset(asset).into());
    }

    // Step 1: ready weapon owners
    let owners: Vec<_> = assets
        .subtree(asset)
        .into_iter()
        .filter_map(|id| assets.get(id))
        .filter(|record| {
            if !record.is_ready() {
                return false;
            }
            if record.id != asset && record.is_stale(ctx.now, ctx.config.stale_asset_time_secs) {
                warn!(asset = %record.id, last_update = record.last_update_time, "skipping stale subordinate");
                return false;
            }
            true
        })
        .collect();

    let mut assessment = Assessment {
        asset,
        time: ctx.now,
        ..Default::default()
    };

    // Step 2: pairings per ranked threat
    for threat in ranked_threats(threats, ctx) {
        assessment.threats.push(threat.id());

        let track = threat.track.extrapolated(ctx.now.max(threat.track.update_time));
        let query = TargetQuery::from_track(&track);
        if ctx.table.lookup(&query).is_none() {
            if ctx.config.diagnostic_mode {
                let closest: Vec<String> = ctx
                    .table
                    .closest_matches(&query)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                warn!(
                    threat = %threat.id(),
                    target_type = query.target_type,
                    target_subtype = query.target_subtype,
                    altitude = query.altitude_m,
                    speed = query.speed_mps,
                    closest = ?closest,
                    "no weapon preference row"
                );
            }
            assessment.unpreferred.push(threat.id());
            continue;
        }

        for owner in &owners {
            for weapon in &owner.weapons {
                let pairing = evaluate(owner, weapon, threat, ctx);
                if pairing.failure == Some(PairingFailure::ExcludedWeaponType) {
                    continue;
                }
                assessment.pairings.push(pairing);
            }
        }
    }

    Ok(assessment)
}

/// Order pairings by threat rank, then time to intercept, then identifiers.
pub fn prioritize_pairings(pairings: &mut [WeaponPairing]) {
    pairings.sort_by(|a, b| {
        a.threat_priority
            .cmp(&b.threat_priority)
            .then(a.time_to_intercept.total_cmp(&b.time_to_intercept))
            .then(a.threat_id.cmp(&b.threat_id))
            .then(a.weapon_id.cmp(&b.weapon_id))
    });
}

fn write_back(threats: &mut [Threat], allocation: &Allocation) {
    if let Some(threat) = threats.iter_mut().find(|t| t.id() == allocation.threat_id) {
        threat.zone_types = allocation.pairing.zone_types;
        threat.allocated_weapon = Some(allocation.pairing.weapon_id);
    }
    info!(
        threat = %allocation.threat_id,
        weapon = %allocation.pairing.weapon_id,
        tti = allocation.pairing.time_to_intercept,
        score = allocation.pairing.score,
        zones = %allocation.pairing.zone_types,
        "threat allocated"
    );
}

/// Per threat, the eligible pairing with the minimum time to intercept.
///
/// Ties on time go to the higher score, then the lower weapon id.
/// `is_valid` lets the caller veto pairings, e.g. over-assigned threats.
pub fn allocate<F>(assessment: &Assessment, threats: &mut [Threat], is_valid: F) -> AllocationOutcome
where
    F: Fn(&WeaponPairing) -> bool,
{
    let mut outcome = AllocationOutcome::default();

    for &threat_id in &assessment.threats {
        let best = assessment
            .pairings_for(threat_id)
            .filter(|p| p.eligible() && is_valid(p))
            .min_by(|a, b| {
                a.time_to_intercept
                    .total_cmp(&b.time_to_intercept)
                    .then(b.score.total_cmp(&a.score))
                    .then(a.weapon_id.cmp(&b.weapon_id))
            });

        match best {
            Some(pairing) => {
                let allocation = Allocation {
                    threat_id,
                    pairing: pairing.clone(),
                };
                write_back(threats, &allocation);
                outcome.allocations.push(allocation);
            }
            None => outcome.unallocated.push(threat_id),
        }
    }

    outcome
}

/// Joint allocation minimizing total time to intercept, each weapon used once.
pub fn allocate_optimal<F>(
    assessment: &Assessment,
    threats: &mut [Threat],
    is_valid: F,
) -> EngageResult<AllocationOutcome>
where
    F: Fn(&WeaponPairing) -> bool,
{
    let usable: Vec<&WeaponPairing> = assessment
        .pairings
        .iter()
        .filter(|p| p.eligible() && p.time_to_intercept.is_finite() && is_valid(p))
        .collect();

    let weapons: Vec<Identifier> = usable
        .iter()
        .map(|p| p.weapon_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut outcome = AllocationOutcome::default();
    if weapons.is_empty() {
        outcome.unallocated = assessment.threats.clone();
        return Ok(outcome);
    }

    // Forbidden cells cost more than any complete finite matching
    let sentinel = (usable.iter().map(|p| p.time_to_intercept).sum::<f64>() + 1.0) * 2.0;
    let mut costs = vec![vec![sentinel; weapons.len()]; assessment.threats.len()];
    let mut chosen: Vec<Vec<Option<&WeaponPairing>>> =
        vec![vec![None; weapons.len()]; assessment.threats.len()];

    for (r, threat_id) in assessment.threats.iter().enumerate() {
        for pairing in usable.iter().filter(|p| p.threat_id == *threat_id) {
            let Ok(c) = weapons.binary_search(&pairing.weapon_id) else {
                continue;
            };
            if pairing.time_to_intercept < costs[r][c] {
                costs[r][c] = pairing.time_to_intercept;
                chosen[r][c] = Some(pairing);
            }
        }
    }

    let solution = solve(&costs)?;

    for (r, &threat_id) in assessment.threats.iter().enumerate() {
        let pairing = solution.col_for_row(r).and_then(|c| chosen[r][c]);
        match pairing {
            Some(pairing) => {
                let allocation = Allocation {
                    threat_id,
                    pairing: pairing.clone(),
                };
                write_back(threats, &allocation);
                outcome.allocations.push(allocation);
            }
            None => outcome.unallocated.push(threat_id),
        }
    }

    Ok(outcome)
}
