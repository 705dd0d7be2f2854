//! Weapon records owned by assets.

use serde::{Deserialize, Serialize};

use crate::enums::{ShotDoctrine, WeaponKind};
use crate::types::{Identifier, Position};
use crate::zone::Zone;

/// Category-specific weapon data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum WeaponCategory {
    /// Airborne interceptor. Not subject to terrain masking at launch.
    AirIntercept {
        /// Cruise speed of the launch platform (m/s).
        #[serde(default)]
        platform_speed_mps: f64,
    },
    /// Ground-launched missile system.
    SurfaceToAir {
        /// Inner engagement boundary (meters).
        #[serde(default)]
        min_range_m: f64,
    },
    Other {
        /// Whether the system sits on the ground and needs line of sight.
        #[serde(default)]
        ground_based: bool,
    },
}

impl WeaponCategory {
    pub fn kind(&self) -> WeaponKind {
        match self {
            WeaponCategory::AirIntercept { .. } => WeaponKind::AirIntercept,
            WeaponCategory::SurfaceToAir { .. } => WeaponKind::SurfaceToAir,
            WeaponCategory::Other { .. } => WeaponKind::Other,
        }
    }

    pub fn is_ground_based(&self) -> bool {
        match self {
            WeaponCategory::AirIntercept { .. } => false,
            WeaponCategory::SurfaceToAir { .. } => true,
            WeaponCategory::Other { ground_based } => *ground_based,
        }
    }

    /// Minimum engagement range, if the category has one.
    pub fn min_range_m(&self) -> f64 {
        match self {
            WeaponCategory::SurfaceToAir { min_range_m } => *min_range_m,
            _ => 0.0,
        }
    }
}

impl Default for WeaponCategory {
    fn default() -> Self {
        WeaponCategory::SurfaceToAir { min_range_m: 0.0 }
    }
}

/// A weapon system and its readiness counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRecord {
    /// (owning unit, weapon index).
    pub id: Identifier,
    #[serde(default)]
    pub name: String,
    /// Specific system type, matched against preference-table subtype lists.
    pub system_type: String,
    #[serde(flatten)]
    pub category: WeaponCategory,
    pub position: Position,
    /// Prepared munitions.
    pub munitions: u32,
    /// Fire channels not currently tied to an assignment.
    pub fire_channels: u32,
    pub max_range_m: f64,
    /// Average fly-out speed of the munition (m/s).
    pub munition_speed_mps: f64,
    /// Single-shot probability of kill at short range.
    pub nominal_pk: f64,
    #[serde(default)]
    pub shot_doctrine: ShotDoctrine,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl WeaponRecord {
    /// Owning asset identifier.
    pub fn owner(&self) -> Identifier {
        Identifier::unit(self.id.unit)
    }

    pub fn has_munitions(&self) -> bool {
        self.munitions > 0
    }

    pub fn has_fire_channels(&self) -> bool {
        self.fire_channels > 0
    }
}
