//! Tick loop: status reports, assignment monitoring, assessment,
//! allocation, commitment, and dissemination for the simulated asset.
//!
//! When weapon simulation is on, the driver also plays the weapon side of
//! each assignment: WILCO on the next tick, FIRING once the launch delays
//! have passed, then KILL or HAVCO failure at the intercept time drawn
//! against the pairing's Pk.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use palisade_c2::{DisseminationRouter, Envelope, Payload, RoutingConfig, TrackUpdateMessage};
use palisade_core::enums::{AssignmentStatus, CantcoScope};
use palisade_core::services::{OpenTerrain, TerrainQuery};
use palisade_core::{AssetMap, CoreError, Identifier};
use palisade_engage::assignment::{REASON_NO_SUBORDINATE_WEAPONS, REASON_NO_WEAPON_PREFERENCE};
use palisade_engage::{
    allocate, allocate_optimal, assess, monitor, AllocationStrategy, Assessment, AssignmentBook,
    AssignmentMessage, AssignmentStatusMessage, EngageError, EngagementConfig, ExclusionList,
    KinematicInterceptCalculator, PairingContext, StatusOutcome, Threat, WeaponPairing,
    WeaponTable,
};
use palisade_terrain::TerrainGrid;

use crate::scenario::Scenario;

/// Expected timeline of a committed assignment.
#[derive(Debug, Clone, Copy)]
struct Engagement {
    launch_time: f64,
    intercept_time: f64,
    pk: f64,
}

/// Everything that happened in one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub time: f64,
    pub pairings: usize,
    pub committed: Vec<AssignmentMessage>,
    /// Assessed threats no weapon could take this tick.
    pub unallocated: Vec<Identifier>,
    pub unpreferred: Vec<Identifier>,
    pub cancelled: Vec<AssignmentMessage>,
    /// (track, unit) exclusions recorded from CANTCO replies.
    pub excluded: Vec<(Identifier, Identifier)>,
    pub kills: Vec<Identifier>,
    pub envelopes: Vec<Envelope>,
}

pub struct Driver {
    self_id: Identifier,
    start_time: f64,
    assets: AssetMap,
    threats: Vec<Threat>,
    table: WeaponTable,
    engagement: EngagementConfig,
    routing: RoutingConfig,
    terrain: Option<TerrainGrid>,
    silent: BTreeSet<Identifier>,
    simulate_weapons: bool,
    calculator: KinematicInterceptCalculator,
    exclusions: ExclusionList,
    book: AssignmentBook,
    engagements: BTreeMap<(Identifier, Identifier), Engagement>,
    rng: ChaCha8Rng,
}

impl Driver {
    pub fn new(scenario: Scenario) -> Result<Self> {
        let world = scenario.build()?;
        info!(
            scenario = %scenario.name,
            assets = world.assets.len(),
            threats = world.threats.len(),
            rows = world.table.rows().len(),
            "scenario loaded"
        );
        Ok(Self {
            self_id: scenario.self_asset,
            start_time: scenario.start_time,
            assets: world.assets,
            threats: world.threats,
            table: world.table,
            engagement: scenario.engagement,
            routing: scenario.routing,
            terrain: scenario.terrain,
            silent: scenario.silent_assets.into_iter().collect(),
            simulate_weapons: scenario.simulate_weapons,
            calculator: KinematicInterceptCalculator::default(),
            exclusions: ExclusionList::new(),
            book: AssignmentBook::new(),
            engagements: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(scenario.seed),
        })
    }

    pub fn threats(&self) -> &[Threat] {
        &self.threats
    }

    pub fn book(&self) -> &AssignmentBook {
        &self.book
    }

    /// Run `ticks` ticks spaced `dt` seconds apart from the scenario start.
    pub fn run(&mut self, ticks: u32, dt: f64) -> Result<Vec<TickReport>> {
        (0..ticks)
            .map(|i| self.tick(self.start_time + i as f64 * dt))
            .collect()
    }

    pub fn tick(&mut self, now: f64) -> Result<TickReport> {
        let mut report = TickReport {
            time: now,
            ..Default::default()
        };

        // Step 1: status reports and track extrapolation
        for record in self.assets.iter_mut() {
            if !self.silent.contains(&record.id) {
                record.last_update_time = now;
            }
        }
        for threat in &mut self.threats {
            threat.track.extrapolate_in_place(now);
        }

        // Step 2: assignment monitors
        for message in monitor::run(&mut self.book, &mut self.assets, now, &self.engagement)? {
            self.engagements
                .remove(&(message.reference_track_id, message.assigned_weapon));
            let envelopes = self.route(self.self_id, Payload::AssignmentCancel(message.clone()), now)?;
            report.envelopes.extend(envelopes);
            report.cancelled.push(message);
        }

        // Step 3: weapon responses
        if self.simulate_weapons {
            self.play_weapons(now, &mut report)?;
        }

        // Step 4: assessment
        let terrain: &dyn TerrainQuery = match &self.terrain {
            Some(grid) => grid,
            None => &OpenTerrain,
        };
        let ctx = PairingContext {
            table: &self.table,
            intercept: &self.calculator,
            terrain,
            config: &self.engagement,
            exclusions: &self.exclusions,
            now,
        };
        let assessment = assess(self.self_id, &self.assets, &self.threats, &ctx)?;
        report.pairings = assessment.pairings.len();
        report.unpreferred = assessment.unpreferred.clone();

        // Step 5: allocation
        let max_per_track = self.engagement.max_assignments_per_track;
        let book = &self.book;
        let is_valid = |p: &WeaponPairing| book.is_assignable(p, max_per_track);
        let outcome = match self.engagement.strategy {
            AllocationStrategy::MinTimeToIntercept => {
                allocate(&assessment, &mut self.threats, is_valid)
            }
            AllocationStrategy::Optimal => {
                allocate_optimal(&assessment, &mut self.threats, is_valid)?
            }
        };

        // Step 6: commit and disseminate
        let mut unallocated = outcome.unallocated.clone();
        for allocation in &outcome.allocations {
            let message = match self.book.commit(allocation, self.self_id, &mut self.assets, now) {
                Ok(message) => message,
                Err(EngageError::Core(CoreError::ReadinessExhausted { asset, resource })) => {
                    // Another threat took the weapon earlier in this tick
                    debug!(
                        threat = %allocation.threat_id,
                        asset = %asset,
                        resource,
                        "allocation not committed"
                    );
                    if let Some(threat) =
                        self.threats.iter_mut().find(|t| t.id() == allocation.threat_id)
                    {
                        threat.allocated_weapon = None;
                    }
                    unallocated.push(allocation.threat_id);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let key = (message.reference_track_id, message.assigned_weapon);
            self.engagements.insert(
                key,
                Engagement {
                    launch_time: now + self.engagement.delays().total(),
                    intercept_time: now + allocation.pairing.time_to_intercept,
                    pk: allocation.pairing.pk,
                },
            );

            let envelopes = self.route(self.self_id, Payload::Assignment(message.clone()), now)?;
            report.envelopes.extend(envelopes);
            if let Some(threat) = self.threats.iter().find(|t| t.id() == allocation.threat_id) {
                let update = Payload::TrackAssignmentUpdate(TrackUpdateMessage {
                    track: threat.track.clone(),
                    destination: Some(message.assigned_unit()),
                });
                let envelopes = self.route(self.self_id, update, now)?;
                report.envelopes.extend(envelopes);
            }
            report.committed.push(message);
        }

        // Step 7: threats left without a weapon
        for track in unallocated {
            if assessment.unpreferred.contains(&track) {
                continue;
            }
            if self.holds_delegation(&assessment, track) {
                continue;
            }
            let cancelled = self
                .book
                .cancel_delegations_for_track(track, now, &mut self.assets)?;
            if cancelled.is_empty() {
                debug!(threat = %track, "no feasible weapon this tick");
            }
            for message in cancelled {
                self.engagements
                    .remove(&(message.reference_track_id, message.assigned_weapon));
                let envelopes = self.route(self.self_id, Payload::AssignmentCancel(message.clone()), now)?;
                report.envelopes.extend(envelopes);
                let envelopes = self.report_upward(&message, now)?;
                report.envelopes.extend(envelopes);
                report.cancelled.push(message);
            }
            report.unallocated.push(track);
        }

        // Step 8: CANTCO for threats with no preference row
        for &track in &assessment.unpreferred {
            let replies = self.book.cantco_track(
                track,
                now,
                REASON_NO_WEAPON_PREFERENCE,
                CantcoScope::Local,
                &mut self.assets,
            )?;
            for message in replies {
                let unit = message.assigned_unit();
                self.exclusions
                    .add(track, unit, CantcoScope::Local, REASON_NO_WEAPON_PREFERENCE);
                report.excluded.push((track, unit));
                let envelopes = self.route(unit, Payload::AssignmentStatus(message), now)?;
                report.envelopes.extend(envelopes);
            }
        }

        info!(
            time = now,
            pairings = report.pairings,
            committed = report.committed.len(),
            unallocated = report.unallocated.len(),
            unpreferred = report.unpreferred.len(),
            cancelled = report.cancelled.len(),
            excluded = report.excluded.len(),
            kills = report.kills.len(),
            messages = report.envelopes.len(),
            "tick complete"
        );
        Ok(report)
    }

    /// Whether a delegated weapon already on `track` is still usable, short
    /// only of counters its own assignment is holding.
    fn holds_delegation(&self, assessment: &Assessment, track: Identifier) -> bool {
        let delegated: BTreeSet<Identifier> = self
            .book
            .active()
            .filter(|m| m.reference_track_id == track && m.delegation)
            .map(|m| m.assigned_weapon)
            .collect();
        assessment.pairings_for(track).any(|p| {
            delegated.contains(&p.weapon_id) && p.failure.map_or(true, |f| f.is_readiness())
        })
    }

    /// CANTCO a cancelled delegation to the unit above: whoever initiated
    /// it, or this asset's commander when it originated here.
    fn report_upward(&self, cancelled: &AssignmentMessage, now: f64) -> Result<Vec<Envelope>> {
        let above = if cancelled.initiating_unit != self.self_id {
            Some(cancelled.initiating_unit)
        } else {
            self.assets.commander_of(self.self_id)
        };
        let Some(above) = above else {
            debug!(threat = %cancelled.reference_track_id, "no unit above to report to");
            return Ok(Vec::new());
        };

        let mut report = cancelled.clone();
        report.assigning_unit = above;
        report.status = AssignmentStatusMessage {
            status: AssignmentStatus::Cantco,
            status_time: now,
            reporting_unit: self.self_id,
            cantco_reason: Some(REASON_NO_SUBORDINATE_WEAPONS.to_string()),
            cantco_scope: Some(CantcoScope::Local),
        };
        self.route(self.self_id, Payload::AssignmentStatus(report), now)
    }

    /// Advance each simulated assignment by at most one status per tick.
    fn play_weapons(&mut self, now: f64, report: &mut TickReport) -> Result<()> {
        for (track, weapon) in self.book.active_keys() {
            let Some(plan) = self.engagements.get(&(track, weapon)).copied() else {
                continue;
            };
            let Some(message) = self.book.get(track, weapon) else {
                continue;
            };
            let unit = message.assigned_unit();

            let status = match message.status.status {
                AssignmentStatus::Unacknowledged => AssignmentStatus::Wilco,
                _ if message.shots_fired == 0 && now >= plan.launch_time => {
                    AssignmentStatus::Firing
                }
                _ if message.shots_fired > 0 && now >= plan.intercept_time => {
                    if self.rng.gen::<f64>() < plan.pk {
                        AssignmentStatus::Kill
                    } else {
                        AssignmentStatus::HavcoFailure
                    }
                }
                _ => continue,
            };

            let update = AssignmentStatusMessage {
                status,
                status_time: now,
                reporting_unit: unit,
                ..Default::default()
            };
            if self.book.apply_status(track, weapon, update, &mut self.assets)?
                == StatusOutcome::Ignored
            {
                continue;
            }
            let Some(message) = self.book.get(track, weapon).cloned() else {
                continue;
            };
            let envelopes = self.route(unit, Payload::AssignmentStatus(message), now)?;
            report.envelopes.extend(envelopes);

            match status {
                AssignmentStatus::Kill => {
                    info!(threat = %track, weapon = %weapon, "threat destroyed");
                    self.threats.retain(|t| t.id() != track);
                    self.exclusions.remove_track(track);
                    self.engagements.remove(&(track, weapon));
                    report.kills.push(track);
                }
                AssignmentStatus::HavcoFailure => {
                    warn!(threat = %track, weapon = %weapon, "engagement failed, threat survives");
                    self.engagements.remove(&(track, weapon));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn route(&self, from: Identifier, payload: Payload, now: f64) -> Result<Vec<Envelope>> {
        let router = DisseminationRouter::new(from, &self.assets, &self.routing);
        Ok(router.route(&payload, now)?)
    }
}
