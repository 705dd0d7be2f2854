//! Scenario files: the asset hierarchy, inbound threats, the weapon
//! preference table, and the engagement and routing configuration.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use palisade_c2::RoutingConfig;
use palisade_core::{AssetMap, AssetRecord, Identifier, Position, Track};
use palisade_engage::{EngagementConfig, Threat, WeaponPreferenceRow, WeaponTable};
use palisade_terrain::TerrainGrid;

/// An inbound track as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatSpec {
    pub id: Identifier,
    pub position: Position,
    /// East, north, up velocity (m/s).
    #[serde(default)]
    pub velocity_enu: [f64; 3],
    pub target_type: String,
    #[serde(default)]
    pub target_subtype: String,
    #[serde(default = "default_rank")]
    pub rank: u32,
}

fn default_rank() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl ThreatSpec {
    fn to_threat(&self, time: f64) -> Threat {
        let [east, north, up] = self.velocity_enu;
        let track = Track::with_enu_velocity(self.id, time, self.position, east, north, up)
            .with_type(&self.target_type, &self.target_subtype);
        Threat::new(track, self.rank)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The asset whose decisions are simulated.
    pub self_asset: Identifier,
    #[serde(default)]
    pub start_time: f64,
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub threats: Vec<ThreatSpec>,
    pub weapon_table: Vec<WeaponPreferenceRow>,
    #[serde(default)]
    pub engagement: EngagementConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub terrain: Option<TerrainGrid>,
    /// Assets that stop sending status reports after the start.
    #[serde(default)]
    pub silent_assets: Vec<Identifier>,
    /// Play the weapon side of each assignment (acknowledge, fire, assess).
    #[serde(default = "default_true")]
    pub simulate_weapons: bool,
    /// Seed for engagement outcome draws.
    #[serde(default)]
    pub seed: u64,
}

/// Validated runtime state built from a scenario.
#[derive(Debug, Clone)]
pub struct World {
    pub assets: AssetMap,
    pub threats: Vec<Threat>,
    pub table: WeaponTable,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse scenario")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Validate every part of the scenario and link the command hierarchy.
    pub fn build(&self) -> Result<World> {
        // Step 1: assets and their weapons
        let mut assets = AssetMap::new();
        for record in &self.assets {
            ensure!(
                record.id.is_valid() && record.id.sub == 0,
                "asset '{}' must have a unit identifier, got {}",
                record.name,
                record.id
            );
            for weapon in &record.weapons {
                ensure!(
                    weapon.owner() == record.id,
                    "weapon {} is not numbered under asset {}",
                    weapon.id,
                    record.id
                );
            }
            let zones = record
                .zones
                .iter()
                .chain(record.weapons.iter().flat_map(|w| w.zones.iter()));
            for zone in zones {
                zone.validate()
                    .with_context(|| format!("zone '{}' on asset {}", zone.name, record.id))?;
            }
            ensure!(
                assets.insert(record.clone()).is_none(),
                "asset {} is defined twice",
                record.id
            );
        }

        // Step 2: hierarchy
        assets
            .link_hierarchy()
            .context("invalid command hierarchy")?;
        ensure!(
            assets.contains(self.self_asset),
            "self asset {} is not defined",
            self.self_asset
        );
        for id in &self.silent_assets {
            ensure!(assets.contains(*id), "silent asset {id} is not defined");
        }

        // Step 3: configuration and preference table
        self.engagement
            .validate()
            .context("invalid engagement configuration")?;
        let table =
            WeaponTable::new(self.weapon_table.clone()).context("invalid weapon table")?;

        // Step 4: threats
        let mut seen = BTreeSet::new();
        let mut threats = Vec::with_capacity(self.threats.len());
        for spec in &self.threats {
            ensure!(spec.id.is_valid(), "threat has an invalid identifier {}", spec.id);
            ensure!(seen.insert(spec.id), "threat {} is defined twice", spec.id);
            ensure!(spec.rank >= 1, "threat {} must have rank 1 or higher", spec.id);
            threats.push(spec.to_threat(self.start_time));
        }

        Ok(World {
            assets,
            threats,
            table,
        })
    }
}
