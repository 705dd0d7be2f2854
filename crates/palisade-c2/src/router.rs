//! Dissemination router.
//!
//! Each message category maps to a set of routing policies. Policies add up:
//! a message may go to subordinates, peers, the commander, and a dynamic
//! next hop all at once, each destination receiving exactly one copy.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::BitOr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use palisade_core::{AssetMap, AssetRecord, Identifier};

use crate::error::{RouteError, RouteResult};
use crate::messages::{Envelope, MessageCategory, Payload};

/// Bitmask of routing policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingPolicies(u8);

impl RoutingPolicies {
    pub const NONE: RoutingPolicies = RoutingPolicies(0);
    pub const SUBORDINATE: RoutingPolicies = RoutingPolicies(1);
    pub const PEER: RoutingPolicies = RoutingPolicies(1 << 1);
    pub const COMMANDER: RoutingPolicies = RoutingPolicies(1 << 2);
    pub const DYNAMIC: RoutingPolicies = RoutingPolicies(1 << 3);

    pub fn contains(self, other: RoutingPolicies) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: RoutingPolicies) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for RoutingPolicies {
    type Output = RoutingPolicies;

    fn bitor(self, rhs: RoutingPolicies) -> RoutingPolicies {
        RoutingPolicies(self.0 | rhs.0)
    }
}

/// How the dynamic policy picks its single next hop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DynamicStyle {
    /// Straight to the message's semantic destination.
    #[default]
    Direct,
    /// One hop toward the destination along the command chain.
    NextUnit,
    /// Relay one hop at a time while a C2-capable node lies ahead of the
    /// destination; otherwise address the destination directly.
    NextC2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub policies: BTreeMap<MessageCategory, RoutingPolicies>,
    pub dynamic_style: DynamicStyle,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let policies = MessageCategory::ALL
            .into_iter()
            .map(|category| {
                let policy = match category {
                    MessageCategory::TrackUpdate | MessageCategory::Status => {
                        RoutingPolicies::COMMANDER
                    }
                    _ => RoutingPolicies::DYNAMIC,
                };
                (category, policy)
            })
            .collect();
        Self {
            policies,
            dynamic_style: DynamicStyle::Direct,
        }
    }
}

impl RoutingConfig {
    pub fn from_json(json: &str) -> RouteResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn policy(&self, category: MessageCategory) -> RoutingPolicies {
        self.policies.get(&category).copied().unwrap_or_default()
    }

    pub fn set_policy(&mut self, category: MessageCategory, policy: RoutingPolicies) {
        self.policies.insert(category, policy);
    }
}

/// Router for messages leaving one asset.
#[derive(Debug, Clone, Copy)]
pub struct DisseminationRouter<'a> {
    pub self_id: Identifier,
    pub assets: &'a AssetMap,
    pub config: &'a RoutingConfig,
}

impl<'a> DisseminationRouter<'a> {
    pub fn new(self_id: Identifier, assets: &'a AssetMap, config: &'a RoutingConfig) -> Self {
        Self {
            self_id,
            assets,
            config,
        }
    }

    fn me(&self) -> RouteResult<&'a AssetRecord> {
        self.assets
            .get(self.self_id)
            .ok_or(RouteError::UnknownSender(self.self_id))
    }

    /// Concrete destinations for `payload`, one stamped copy each.
    pub fn route(&self, payload: &Payload, now: f64) -> RouteResult<Vec<Envelope>> {
        let me = self.me()?;
        let category = payload.category();
        let semantic = payload.semantic_destination();

        let destinations = if semantic == Some(self.self_id) {
            vec![self.self_id]
        } else {
            self.policy_destinations(me, category, semantic)
        };

        let envelopes: Vec<Envelope> = destinations
            .into_iter()
            .map(|destination| Envelope {
                sender: self.self_id,
                destination,
                broadcast: false,
                transmit_time: now,
                payload: payload.clone(),
            })
            .collect();

        for envelope in &envelopes {
            info!(
                sender = %envelope.sender,
                destination = %envelope.destination,
                ?category,
                "message routed"
            );
        }
        Ok(envelopes)
    }

    fn policy_destinations(
        &self,
        me: &AssetRecord,
        category: MessageCategory,
        semantic: Option<Identifier>,
    ) -> Vec<Identifier> {
        let policy = self.config.policy(category);
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        let mut push = |id: Identifier| {
            if seen.insert(id) {
                out.push(id);
            }
        };

        if policy.contains(RoutingPolicies::SUBORDINATE) {
            me.subordinates.iter().copied().for_each(&mut push);
        }
        if policy.contains(RoutingPolicies::PEER) {
            me.peers.iter().copied().for_each(&mut push);
        }
        if policy.contains(RoutingPolicies::COMMANDER) {
            if let Some(commander) = me.commander {
                push(commander);
            }
        }
        if policy.contains(RoutingPolicies::DYNAMIC) {
            match semantic {
                Some(dest) => push(self.next_hop(dest)),
                None => debug!(?category, "dynamic routing skipped, message has no destination"),
            }
        }

        if out.is_empty() {
            debug!(?category, ?policy, "no destinations for message");
        }
        out
    }

    /// Dynamic next hop toward `dest` under the configured style.
    pub fn next_hop(&self, dest: Identifier) -> Identifier {
        match self.config.dynamic_style {
            DynamicStyle::Direct => dest,
            DynamicStyle::NextUnit => self.next_unit_toward(self.self_id, dest),
            DynamicStyle::NextC2 => self.next_c2_toward(dest),
        }
    }

    /// One hop from `from` toward `dest`: directly if adjacent, down the
    /// subtree holding `dest`, otherwise up to the commander.
    pub fn next_unit_toward(&self, from: Identifier, dest: Identifier) -> Identifier {
        if from == dest {
            return dest;
        }
        let Some(record) = self.assets.get(from) else {
            return dest;
        };
        if record.subordinates.contains(&dest) || record.peers.contains(&dest) {
            return dest;
        }
        if let Some(sub) = self.assets.find_next_subordinate_in_chain(from, dest) {
            return sub;
        }
        record.commander.unwrap_or(dest)
    }

    /// Hop-by-hop path from this asset to `dest`, ending at `dest` unless the
    /// walk breaks or revisits a node.
    pub fn c2_path(&self, dest: Identifier) -> Vec<Identifier> {
        let mut path = Vec::new();
        let mut visited = BTreeSet::from([self.self_id]);
        let mut current = self.self_id;
        while current != dest {
            let next = self.next_unit_toward(current, dest);
            if !visited.insert(next) {
                break;
            }
            path.push(next);
            current = next;
        }
        path
    }

    /// Next relay toward `dest` when some node before it on the path can
    /// carry C2 traffic, or `dest` itself. Each relay resolves its own next
    /// hop, so the message walks the chain until it reaches a C2 node.
    pub fn next_c2_toward(&self, dest: Identifier) -> Identifier {
        let path = self.c2_path(dest);
        let relayed = path
            .iter()
            .copied()
            .take_while(|id| *id != dest)
            .any(|id| self.assets.get(id).is_some_and(|a| a.c2_capable));
        match path.first() {
            Some(&hop) if relayed => hop,
            // Adjacent
            Some(&hop) if hop == dest => dest,
            _ => {
                warn!(
                    from = %self.self_id,
                    destination = %dest,
                    path = ?path,
                    "no C2-capable node toward destination, addressing it directly"
                );
                dest
            }
        }
    }
}
