//! Ranked threats under consideration for engagement.

use serde::{Deserialize, Serialize};

use palisade_core::{Identifier, Track, ZoneTypeMask};

/// A hostile track with its engagement rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub track: Track,
    /// 1 is the most urgent.
    pub rank: u32,
    /// Zone classification of the winning pairing, written by allocation.
    #[serde(default)]
    pub zone_types: ZoneTypeMask,
    /// Weapon chosen by the last allocation.
    #[serde(default)]
    pub allocated_weapon: Option<Identifier>,
}

impl Threat {
    pub fn new(track: Track, rank: u32) -> Self {
        Self {
            track,
            rank,
            zone_types: ZoneTypeMask::EMPTY,
            allocated_weapon: None,
        }
    }

    pub fn id(&self) -> Identifier {
        self.track.id
    }
}
