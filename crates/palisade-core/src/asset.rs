//! Asset records and the identifier-keyed hierarchy arena.
//!
//! Cross-references between assets are identifiers, never owned pointers.
//! The commander relation must stay acyclic; every mutation that adds a
//! commander edge checks for cycles before applying it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enums::SystemStatus;
use crate::error::{CoreError, CoreResult};
use crate::types::{Identifier, Position};
use crate::weapon::WeaponRecord;
use crate::zone::Zone;

/// A sensor, weapon, or C2 node in the command hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: Identifier,
    #[serde(default)]
    pub name: String,
    pub position: Position,
    /// Direct commander. May name an asset not (yet) in the arena.
    #[serde(default)]
    pub commander: Option<Identifier>,
    #[serde(default)]
    pub subordinates: BTreeSet<Identifier>,
    #[serde(default)]
    pub peers: BTreeSet<Identifier>,
    /// Authorized to make or relay engagement decisions.
    #[serde(default)]
    pub c2_capable: bool,
    #[serde(default)]
    pub status: SystemStatus,
    /// Assignment capacity. Zero means unlimited.
    #[serde(default)]
    pub max_assignments: u32,
    /// Assignment slots still free.
    #[serde(default)]
    pub open_assignments: u32,
    /// Time of the last status report from this asset (seconds).
    #[serde(default)]
    pub last_update_time: f64,
    #[serde(default)]
    pub weapons: Vec<WeaponRecord>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl AssetRecord {
    pub fn new(id: Identifier, name: &str, position: Position) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            commander: None,
            subordinates: BTreeSet::new(),
            peers: BTreeSet::new(),
            c2_capable: false,
            status: SystemStatus::Green,
            max_assignments: 0,
            open_assignments: 0,
            last_update_time: 0.0,
            weapons: Vec::new(),
            zones: Vec::new(),
        }
    }

    pub fn with_c2(mut self, c2_capable: bool) -> Self {
        self.c2_capable = c2_capable;
        self
    }

    /// Set capacity with every slot free.
    pub fn with_max_assignments(mut self, max: u32) -> Self {
        self.max_assignments = max;
        self.open_assignments = max;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponRecord) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status != SystemStatus::Red
    }

    /// No status report within `max_age` seconds of `now`.
    pub fn is_stale(&self, now: f64, max_age: f64) -> bool {
        now - self.last_update_time > max_age
    }

    pub fn has_open_assignment_slot(&self) -> bool {
        self.max_assignments == 0 || self.open_assignments > 0
    }

    /// Fraction of assignment capacity in use, 0 when capacity is unset.
    pub fn workload(&self) -> f64 {
        if self.max_assignments == 0 {
            return 0.0;
        }
        let used = self.max_assignments - self.open_assignments.min(self.max_assignments);
        used as f64 / self.max_assignments as f64
    }

    pub fn weapon(&self, id: Identifier) -> Option<&WeaponRecord> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn weapon_mut(&mut self, id: Identifier) -> Option<&mut WeaponRecord> {
        self.weapons.iter_mut().find(|w| w.id == id)
    }

    fn adjust_assignments(&mut self, update: ChainUpdate) {
        if self.max_assignments == 0 {
            return;
        }
        match update {
            ChainUpdate::Reserve { .. } => {
                self.open_assignments = self.open_assignments.saturating_sub(1);
            }
            ChainUpdate::Release { .. } => {
                self.open_assignments = (self.open_assignments + 1).min(self.max_assignments);
            }
        }
    }
}

/// Direction of a readiness update along the C2 chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainUpdate {
    /// An assignment was committed; take a slot, a fire channel, and munitions.
    Reserve { munitions: u32 },
    /// An assignment ended; give back the slot, the channel, and unfired munitions.
    Release { munitions: u32 },
}

/// Arena of asset records keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMap {
    assets: BTreeMap<Identifier, AssetRecord>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record. Hierarchy sets are taken as given.
    pub fn insert(&mut self, record: AssetRecord) -> Option<AssetRecord> {
        self.assets.insert(record.id, record)
    }

    pub fn get(&self, id: Identifier) -> Option<&AssetRecord> {
        self.assets.get(&id)
    }

    pub fn get_mut(&mut self, id: Identifier) -> Option<&mut AssetRecord> {
        self.assets.get_mut(&id)
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.assets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AssetRecord> {
        self.assets.values_mut()
    }

    fn require(&self, id: Identifier) -> CoreResult<&AssetRecord> {
        self.assets.get(&id).ok_or(CoreError::UnknownAsset(id))
    }

    fn require_mut(&mut self, id: Identifier) -> CoreResult<&mut AssetRecord> {
        self.assets.get_mut(&id).ok_or(CoreError::UnknownAsset(id))
    }

    // --- Hierarchy mutation ---

    /// Place `sub` directly under `commander`, detaching it from any previous
    /// commander.
    pub fn add_direct_subordinate(&mut self, commander: Identifier, sub: Identifier) -> CoreResult<()> {
        for id in [commander, sub] {
            if !id.is_valid() {
                return Err(CoreError::InvalidIdentifier(id));
            }
        }
        if commander == sub {
            return Err(CoreError::SelfReference(sub));
        }
        self.require(commander)?;
        if self.commander_chain_contains(commander, sub) {
            return Err(CoreError::CommandCycle { commander, sub });
        }

        let previous = self.get(sub).and_then(|r| r.commander);
        if let Some(old) = previous.filter(|old| *old != commander) {
            if let Some(old_record) = self.get_mut(old) {
                old_record.subordinates.remove(&sub);
            }
        }
        if let Some(sub_record) = self.get_mut(sub) {
            sub_record.commander = Some(commander);
        }
        self.require_mut(commander)?.subordinates.insert(sub);
        Ok(())
    }

    /// Record `commander` as the direct commander of `sub`. The commander need
    /// not exist yet; if it does, `sub` is added to its subordinates.
    pub fn set_direct_commander(&mut self, sub: Identifier, commander: Identifier) -> CoreResult<()> {
        if !commander.is_valid() {
            return Err(CoreError::InvalidIdentifier(commander));
        }
        if commander == sub {
            return Err(CoreError::SelfReference(sub));
        }
        self.require(sub)?;
        if self.contains(commander) {
            return self.add_direct_subordinate(commander, sub);
        }
        self.require_mut(sub)?.commander = Some(commander);
        Ok(())
    }

    /// Record `peer` as a lateral neighbor of `id` (one direction only).
    pub fn add_direct_peer(&mut self, id: Identifier, peer: Identifier) -> CoreResult<()> {
        if !peer.is_valid() {
            return Err(CoreError::InvalidIdentifier(peer));
        }
        if id == peer {
            return Err(CoreError::SelfReference(id));
        }
        self.require_mut(id)?.peers.insert(peer);
        Ok(())
    }

    /// Rebuild subordinate sets from the commander fields of every record.
    pub fn link_hierarchy(&mut self) -> CoreResult<()> {
        let edges: Vec<(Identifier, Identifier)> = self
            .assets
            .values()
            .filter_map(|r| r.commander.map(|c| (c, r.id)))
            .collect();
        for (commander, sub) in edges {
            if self.contains(commander) {
                self.add_direct_subordinate(commander, sub)?;
            }
        }
        Ok(())
    }

    // --- Hierarchy queries ---

    pub fn commander_of(&self, id: Identifier) -> Option<Identifier> {
        self.get(id).and_then(|r| r.commander)
    }

    /// Whether walking commander links up from `start` reaches `target`.
    fn commander_chain_contains(&self, start: Identifier, target: Identifier) -> bool {
        let mut visited = BTreeSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.commander_of(id);
        }
        false
    }

    /// Whether `id` is anywhere below `ancestor` in the subordinate tree.
    pub fn is_subordinate(&self, ancestor: Identifier, id: Identifier) -> bool {
        let Some(root) = self.get(ancestor) else {
            return false;
        };
        let mut visited = BTreeSet::new();
        let mut stack: Vec<Identifier> = root.subordinates.iter().copied().collect();
        while let Some(next) = stack.pop() {
            if next == id {
                return true;
            }
            if !visited.insert(next) {
                continue;
            }
            if let Some(record) = self.get(next) {
                stack.extend(record.subordinates.iter().copied());
            }
        }
        false
    }

    /// The direct subordinate of `from` whose subtree holds `dest`.
    pub fn find_next_subordinate_in_chain(&self, from: Identifier, dest: Identifier) -> Option<Identifier> {
        self.get(from)?
            .subordinates
            .iter()
            .copied()
            .find(|sub| *sub == dest || self.is_subordinate(*sub, dest))
    }

    /// One hop up the command chain.
    pub fn find_next_commander_in_chain(&self, from: Identifier) -> Option<Identifier> {
        self.commander_of(from)
    }

    /// `root` and every asset below it, breadth first in identifier order.
    pub fn subtree(&self, root: Identifier) -> Vec<Identifier> {
        let mut out = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(record) = self.get(id) {
                out.push(id);
                queue.extend(record.subordinates.iter().copied());
            }
        }
        out
    }

    // --- Readiness ---

    /// Owning asset and record of a weapon.
    pub fn weapon(&self, weapon_id: Identifier) -> Option<(&AssetRecord, &WeaponRecord)> {
        let owner = self.get(Identifier::unit(weapon_id.unit))?;
        owner.weapon(weapon_id).map(|w| (owner, w))
    }

    /// Apply a readiness update to every asset on the chain from the
    /// assigning unit down to the weapon's owner, then to the weapon itself.
    pub fn update_c2_chain_assigned_unit_status(
        &mut self,
        assigning_unit: Identifier,
        weapon_id: Identifier,
        update: ChainUpdate,
    ) -> CoreResult<()> {
        let assigned_unit = Identifier::unit(weapon_id.unit);
        self.require(assigned_unit)?;

        let mut chain = Vec::new();
        let mut current = Some(assigning_unit);
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            if id == assigned_unit {
                break;
            }
            current = self.find_next_subordinate_in_chain(id, assigned_unit);
        }
        if !chain.contains(&assigned_unit) {
            chain.push(assigned_unit);
        }

        if let ChainUpdate::Reserve { munitions } = update {
            self.check_reservable(&chain, weapon_id, munitions)?;
        }

        debug!(weapon = %weapon_id, ?update, chain = ?chain, "updating C2 chain readiness");
        for id in chain {
            if let Some(record) = self.get_mut(id) {
                record.adjust_assignments(update);
            }
        }

        let weapon = self
            .require_mut(assigned_unit)?
            .weapon_mut(weapon_id)
            .ok_or(CoreError::UnknownWeapon(weapon_id))?;
        match update {
            ChainUpdate::Reserve { munitions } => {
                weapon.fire_channels -= 1;
                weapon.munitions -= munitions;
            }
            ChainUpdate::Release { munitions } => {
                weapon.fire_channels += 1;
                weapon.munitions += munitions;
            }
        }
        Ok(())
    }

    /// A reservation either fits entirely or takes nothing.
    fn check_reservable(
        &self,
        chain: &[Identifier],
        weapon_id: Identifier,
        munitions: u32,
    ) -> CoreResult<()> {
        for &id in chain {
            let Some(record) = self.get(id) else {
                continue;
            };
            if record.max_assignments > 0 && record.open_assignments == 0 {
                return Err(CoreError::ReadinessExhausted {
                    asset: id,
                    resource: "assignment slots",
                });
            }
        }
        let (_, weapon) = self
            .weapon(weapon_id)
            .ok_or(CoreError::UnknownWeapon(weapon_id))?;
        if weapon.fire_channels == 0 {
            return Err(CoreError::ReadinessExhausted {
                asset: weapon_id,
                resource: "fire channels",
            });
        }
        if weapon.munitions < munitions {
            return Err(CoreError::ReadinessExhausted {
                asset: weapon_id,
                resource: "munitions",
            });
        }
        Ok(())
    }
}
