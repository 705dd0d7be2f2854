//! Assignments held by one asset, keyed by (track, weapon).
//!
//! Committing an allocation reserves a slot on every asset along the C2
//! chain down to the weapon's owner, plus a fire channel and munitions on
//! the weapon. A commit the weapon cannot cover fails without reserving
//! anything. The reservation is released exactly once, when the assignment
//! completes, returning the channel and whatever reserved rounds were not
//! fired.

use std::collections::BTreeMap;

use tracing::info;

use palisade_core::asset::ChainUpdate;
use palisade_core::enums::CantcoScope;
use palisade_core::{AssetMap, CoreError, Identifier};

use crate::assessor::Allocation;
use crate::assignment::{
    AssignmentMessage, AssignmentStatusMessage, StatusOutcome, REASON_NO_SUBORDINATE_WEAPONS,
};
use crate::error::{EngageError, EngageResult};
use crate::pairing::WeaponPairing;

#[derive(Debug, Clone, PartialEq)]
pub struct BookEntry {
    pub message: AssignmentMessage,
    /// Readiness counters were reserved for this assignment and not yet released.
    pub reserved: bool,
    /// Rounds taken from the weapon at commit.
    pub munitions_reserved: u32,
}

type Key = (Identifier, Identifier);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentBook {
    entries: BTreeMap<Key, BookEntry>,
}

impl AssignmentBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, track: Identifier, weapon: Identifier) -> Option<&AssignmentMessage> {
        self.entries.get(&(track, weapon)).map(|e| &e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssignmentMessage> {
        self.entries.values().map(|e| &e.message)
    }

    pub fn active(&self) -> impl Iterator<Item = &AssignmentMessage> {
        self.iter().filter(|m| !m.is_complete())
    }

    /// (track, weapon) keys of assignments still in progress.
    pub fn active_keys(&self) -> Vec<(Identifier, Identifier)> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.message.is_complete())
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn active_count_for_track(&self, track: Identifier) -> usize {
        self.active().filter(|m| m.reference_track_id == track).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a new assignment may be made for `pairing`.
    pub fn is_assignable(&self, pairing: &WeaponPairing, max_per_track: u32) -> bool {
        let duplicate = self
            .get(pairing.threat_id, pairing.weapon_id)
            .is_some_and(|m| !m.is_complete());
        !duplicate && self.active_count_for_track(pairing.threat_id) < max_per_track as usize
    }

    fn ensure_not_active(&self, track: Identifier, weapon: Identifier) -> EngageResult<()> {
        if self.get(track, weapon).is_some_and(|m| !m.is_complete()) {
            return Err(EngageError::DuplicateAssignment { track, weapon });
        }
        Ok(())
    }

    /// Turn an allocation into an assignment and reserve readiness along the chain.
    pub fn commit(
        &mut self,
        allocation: &Allocation,
        assigning_unit: Identifier,
        assets: &mut AssetMap,
        now: f64,
    ) -> EngageResult<AssignmentMessage> {
        let track = allocation.threat_id;
        let weapon_id = allocation.pairing.weapon_id;
        self.ensure_not_active(track, weapon_id)?;

        let (doctrine, available) = assets
            .weapon(weapon_id)
            .map(|(_, w)| (w.shot_doctrine, w.munitions))
            .ok_or(CoreError::UnknownWeapon(weapon_id))?;
        // A short weapon commits what it has left
        let munitions = doctrine.munitions_to_commit().min(available);
        if munitions == 0 {
            return Err(CoreError::ReadinessExhausted {
                asset: weapon_id,
                resource: "munitions",
            }
            .into());
        }

        let mut message = AssignmentMessage::new(track, weapon_id, assigning_unit, doctrine, now);
        message.delegation = message.assigned_unit() != assigning_unit;

        assets.update_c2_chain_assigned_unit_status(
            assigning_unit,
            weapon_id,
            ChainUpdate::Reserve { munitions },
        )?;

        info!(
            track = %track,
            weapon = %weapon_id,
            assigning_unit = %assigning_unit,
            delegation = message.delegation,
            "assignment committed"
        );
        self.entries.insert(
            (track, weapon_id),
            BookEntry {
                message: message.clone(),
                reserved: true,
                munitions_reserved: munitions,
            },
        );
        Ok(message)
    }

    /// Record an assignment received from another unit. No readiness is reserved.
    pub fn insert_received(&mut self, message: AssignmentMessage) -> EngageResult<()> {
        let key = (message.reference_track_id, message.assigned_weapon);
        self.ensure_not_active(key.0, key.1)?;
        self.entries.insert(
            key,
            BookEntry {
                message,
                reserved: false,
                munitions_reserved: 0,
            },
        );
        Ok(())
    }

    fn entry_mut(&mut self, track: Identifier, weapon: Identifier) -> EngageResult<&mut BookEntry> {
        self.entries
            .get_mut(&(track, weapon))
            .ok_or(EngageError::UnknownAssignment { track, weapon })
    }

    /// Apply a status report, releasing readiness if it completes the assignment.
    pub fn apply_status(
        &mut self,
        track: Identifier,
        weapon: Identifier,
        update: AssignmentStatusMessage,
        assets: &mut AssetMap,
    ) -> EngageResult<StatusOutcome> {
        let entry = self.entry_mut(track, weapon)?;
        let outcome = entry.message.apply_status(update);
        release_if_complete(entry, assets)?;
        Ok(outcome)
    }

    /// Cancel one assignment. Cancelling a completed assignment changes nothing.
    pub fn cancel(
        &mut self,
        track: Identifier,
        weapon: Identifier,
        time: f64,
        reason: &str,
        assets: &mut AssetMap,
    ) -> EngageResult<AssignmentMessage> {
        let entry = self.entry_mut(track, weapon)?;
        if !entry.message.is_complete() {
            info!(track = %track, weapon = %weapon, reason, "assignment cancelled");
        }
        entry.message.cancel(time, reason);
        release_if_complete(entry, assets)?;
        Ok(entry.message.clone())
    }

    /// Cancel every active delegated assignment on `track` because no
    /// subordinate weapon can take it.
    pub fn cancel_delegations_for_track(
        &mut self,
        track: Identifier,
        time: f64,
        assets: &mut AssetMap,
    ) -> EngageResult<Vec<AssignmentMessage>> {
        let keys = self.active_keys_where(|(t, _), e| *t == track && e.message.delegation);
        self.check_releasable(&keys, assets)?;
        keys.into_iter()
            .map(|(t, w)| self.cancel(t, w, time, REASON_NO_SUBORDINATE_WEAPONS, assets))
            .collect()
    }

    /// Report CANTCO on every active assignment for `track`.
    pub fn cantco_track(
        &mut self,
        track: Identifier,
        time: f64,
        reason: &str,
        scope: CantcoScope,
        assets: &mut AssetMap,
    ) -> EngageResult<Vec<AssignmentMessage>> {
        let keys = self.active_keys_where(|(t, _), _| *t == track);
        self.check_releasable(&keys, assets)?;
        let mut out = Vec::with_capacity(keys.len());
        for (t, w) in keys {
            let entry = self.entry_mut(t, w)?;
            entry.message.cantco(time, reason, scope);
            release_if_complete(entry, assets)?;
            out.push(entry.message.clone());
        }
        Ok(out)
    }

    fn active_keys_where(&self, pred: impl Fn(&Key, &BookEntry) -> bool) -> Vec<Key> {
        self.entries
            .iter()
            .filter(|(k, e)| !e.message.is_complete() && pred(*k, *e))
            .map(|(k, _)| *k)
            .collect()
    }

    /// Fail before touching any entry if a reserved weapon in `keys` has
    /// left the asset map, so a batch completes all or nothing.
    fn check_releasable(&self, keys: &[Key], assets: &AssetMap) -> EngageResult<()> {
        for key in keys {
            let reserved = self.entries.get(key).is_some_and(|e| e.reserved);
            if reserved && assets.weapon(key.1).is_none() {
                return Err(CoreError::UnknownWeapon(key.1).into());
            }
        }
        Ok(())
    }

    /// Drop completed assignments, returning how many were removed.
    pub fn purge_complete(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.message.is_complete());
        before - self.entries.len()
    }
}

fn release_if_complete(entry: &mut BookEntry, assets: &mut AssetMap) -> EngageResult<()> {
    if !entry.reserved || !entry.message.is_complete() {
        return Ok(());
    }
    assets.update_c2_chain_assigned_unit_status(
        entry.message.assigning_unit,
        entry.message.assigned_weapon,
        ChainUpdate::Release {
            munitions: entry.munitions_reserved.saturating_sub(entry.message.shots_fired),
        },
    )?;
    entry.reserved = false;
    Ok(())
}
