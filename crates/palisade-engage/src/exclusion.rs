//! Per-threat asset exclusions recorded from CANTCO reports.

use std::collections::{BTreeMap, BTreeSet};

use palisade_core::enums::CantcoScope;
use palisade_core::Identifier;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
struct Exclusion {
    scope: CantcoScope,
    assets: BTreeSet<Identifier>,
    reason: String,
}

/// Assets that must not be paired against particular threats.
///
/// A local exclusion removes only the listed assets; a global exclusion
/// removes the threat from consideration entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionList {
    entries: BTreeMap<Identifier, Exclusion>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exclusion. A global scope is never downgraded to local.
    pub fn add(&mut self, track: Identifier, asset: Identifier, scope: CantcoScope, reason: &str) {
        debug!(track = %track, asset = %asset, ?scope, reason, "exclusion added");
        let entry = self.entries.entry(track).or_insert_with(|| Exclusion {
            scope,
            assets: BTreeSet::new(),
            reason: reason.to_string(),
        });
        if scope == CantcoScope::Global {
            entry.scope = CantcoScope::Global;
            entry.reason = reason.to_string();
        }
        entry.assets.insert(asset);
    }

    pub fn is_excluded(&self, track: Identifier, asset: Identifier) -> bool {
        self.entries.get(&track).is_some_and(|e| {
            e.scope == CantcoScope::Global || e.assets.contains(&asset)
        })
    }

    pub fn is_globally_excluded(&self, track: Identifier) -> bool {
        self.entries
            .get(&track)
            .is_some_and(|e| e.scope == CantcoScope::Global)
    }

    pub fn reason(&self, track: Identifier) -> Option<&str> {
        self.entries.get(&track).map(|e| e.reason.as_str())
    }

    /// Forget every exclusion for a dropped track.
    pub fn remove_track(&mut self, track: Identifier) {
        self.entries.remove(&track);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
