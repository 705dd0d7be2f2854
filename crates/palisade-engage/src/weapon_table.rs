//! Weapon preference table.
//!
//! Rows map a target description (type, subtype, altitude band, speed band)
//! to per-category priorities and an ordered subtype preference list. Lookup
//! precedence is exact type+subtype, then type with any subtype, then any
//! type; within a tier the first row in table order wins. The table is
//! immutable once built, so lookups may run concurrently.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use palisade_core::enums::WeaponKind;
use palisade_core::Track;

use crate::error::{EngageError, EngageResult};

/// Which targets a row applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum TargetMatch {
    Exact {
        target_type: String,
        target_subtype: String,
    },
    AnySubtype {
        target_type: String,
    },
    AnyType,
}

impl TargetMatch {
    fn tier(&self) -> u8 {
        match self {
            TargetMatch::Exact { .. } => 0,
            TargetMatch::AnySubtype { .. } => 1,
            TargetMatch::AnyType => 2,
        }
    }
}

/// Inclusive numeric band. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Band {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn passes(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }
}

/// Priority per weapon category. Zero excludes the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPriorities {
    #[serde(default)]
    pub air_intercept: u32,
    #[serde(default)]
    pub surface_to_air: u32,
    #[serde(default)]
    pub other: u32,
}

impl CategoryPriorities {
    pub fn get(&self, kind: WeaponKind) -> u32 {
        match kind {
            WeaponKind::AirIntercept => self.air_intercept,
            WeaponKind::SurfaceToAir => self.surface_to_air,
            WeaponKind::Other => self.other,
        }
    }
}

/// Preference for one specific weapon system type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtypePreference {
    pub system_type: String,
    /// Zero excludes the subtype.
    pub priority: u32,
    /// Overrides the row minimum when present.
    #[serde(default)]
    pub min_pk: Option<f64>,
}

/// One preference rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponPreferenceRow {
    #[serde(flatten)]
    pub target: TargetMatch,
    #[serde(default)]
    pub altitude_m: Option<Band>,
    #[serde(default)]
    pub speed_mps: Option<Band>,
    pub category_priorities: CategoryPriorities,
    #[serde(default)]
    pub subtypes: Vec<SubtypePreference>,
    /// Minimum probability of kill for any weapon under this row.
    #[serde(default)]
    pub min_pk: f64,
}

impl WeaponPreferenceRow {
    pub fn subtype_preference(&self, system_type: &str) -> Option<&SubtypePreference> {
        self.subtypes.iter().find(|s| s.system_type == system_type)
    }

    /// Minimum Pk for a weapon of `system_type`.
    pub fn min_pk_for(&self, system_type: &str) -> f64 {
        self.subtype_preference(system_type)
            .and_then(|s| s.min_pk)
            .unwrap_or(self.min_pk)
    }

    fn target_matches(&self, query: &TargetQuery) -> bool {
        match &self.target {
            TargetMatch::Exact {
                target_type,
                target_subtype,
            } => *target_type == query.target_type && *target_subtype == query.target_subtype,
            TargetMatch::AnySubtype { target_type } => *target_type == query.target_type,
            TargetMatch::AnyType => true,
        }
    }

    fn altitude_passes(&self, query: &TargetQuery) -> bool {
        self.altitude_m.map_or(true, |b| b.passes(query.altitude_m))
    }

    fn speed_passes(&self, query: &TargetQuery) -> bool {
        self.speed_mps.map_or(true, |b| b.passes(query.speed_mps))
    }
}

/// Target attributes used for lookup.
#[derive(Debug, Clone, Copy)]
pub struct TargetQuery<'a> {
    pub target_type: &'a str,
    pub target_subtype: &'a str,
    pub altitude_m: f64,
    pub speed_mps: f64,
}

impl<'a> TargetQuery<'a> {
    pub fn from_track(track: &'a Track) -> Self {
        Self {
            target_type: &track.target_type,
            target_subtype: &track.target_subtype,
            altitude_m: track.position.alt_m(),
            speed_mps: track.speed(),
        }
    }
}

/// How closely a row came to matching a query that found no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialMatch {
    pub row: usize,
    pub type_matched: bool,
    pub subtype_matched: bool,
    pub any_type: bool,
    pub any_subtype: bool,
    pub altitude_passed: bool,
    pub speed_passed: bool,
}

impl PartialMatch {
    /// Number of criteria that matched.
    pub fn count(&self) -> usize {
        [
            self.type_matched,
            self.subtype_matched,
            self.any_type,
            self.any_subtype,
            self.altitude_passed,
            self.speed_passed,
        ]
        .iter()
        .filter(|m| **m)
        .count()
    }
}

impl fmt::Display for PartialMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} ({} of 6: type={} subtype={} any_type={} any_subtype={} altitude={} speed={})",
            self.row,
            self.count(),
            self.type_matched,
            self.subtype_matched,
            self.any_type,
            self.any_subtype,
            self.altitude_passed,
            self.speed_passed
        )
    }
}

/// Validated, immutable set of preference rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeaponTable {
    rows: Vec<WeaponPreferenceRow>,
}

impl WeaponTable {
    pub fn new(rows: Vec<WeaponPreferenceRow>) -> EngageResult<Self> {
        for (index, row) in rows.iter().enumerate() {
            validate_row(index, row)?;
        }
        Ok(Self { rows })
    }

    pub fn from_json(json: &str) -> EngageResult<Self> {
        let rows: Vec<WeaponPreferenceRow> = serde_json::from_str(json)?;
        Self::new(rows)
    }

    pub fn rows(&self) -> &[WeaponPreferenceRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&WeaponPreferenceRow> {
        self.rows.get(index)
    }

    /// The single applicable row and its index, or `None` for "no preference".
    pub fn lookup(&self, query: &TargetQuery) -> Option<(usize, &WeaponPreferenceRow)> {
        (0..=2u8).find_map(|tier| {
            self.rows.iter().enumerate().find(|(_, row)| {
                row.target.tier() == tier
                    && row.target_matches(query)
                    && row.altitude_passes(query)
                    && row.speed_passes(query)
            })
        })
    }

    pub fn lookup_track(&self, track: &Track) -> Option<(usize, &WeaponPreferenceRow)> {
        self.lookup(&TargetQuery::from_track(track))
    }

    /// Rows with the highest number of matching criteria, in table order.
    pub fn closest_matches(&self, query: &TargetQuery) -> Vec<PartialMatch> {
        let scored: Vec<PartialMatch> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let (type_matched, subtype_matched) = match &row.target {
                    TargetMatch::Exact {
                        target_type,
                        target_subtype,
                    } => (
                        *target_type == query.target_type,
                        *target_subtype == query.target_subtype,
                    ),
                    TargetMatch::AnySubtype { target_type } => {
                        (*target_type == query.target_type, false)
                    }
                    TargetMatch::AnyType => (false, false),
                };
                PartialMatch {
                    row: index,
                    type_matched,
                    subtype_matched,
                    any_type: matches!(row.target, TargetMatch::AnyType),
                    any_subtype: matches!(row.target, TargetMatch::AnySubtype { .. }),
                    altitude_passed: row.altitude_passes(query),
                    speed_passed: row.speed_passes(query),
                }
            })
            .collect();

        let best = scored.iter().map(PartialMatch::count).max().unwrap_or(0);
        scored.into_iter().filter(|m| m.count() == best).collect()
    }
}

fn validate_row(index: usize, row: &WeaponPreferenceRow) -> EngageResult<()> {
    let invalid = |reason: &str| EngageError::InvalidRow {
        row: index,
        reason: reason.to_string(),
    };

    match &row.target {
        TargetMatch::Exact { target_type, .. } | TargetMatch::AnySubtype { target_type }
            if target_type.is_empty() =>
        {
            return Err(invalid("target type is empty"));
        }
        _ => {}
    }
    if !(0.0..=1.0).contains(&row.min_pk) {
        return Err(invalid("min_pk must be within [0, 1]"));
    }
    for band in [row.altitude_m, row.speed_mps].into_iter().flatten() {
        if let (Some(min), Some(max)) = (band.min, band.max) {
            if min > max {
                return Err(invalid("band minimum exceeds maximum"));
            }
        }
    }

    let mut seen = BTreeSet::new();
    for sub in &row.subtypes {
        if !seen.insert(sub.system_type.as_str()) {
            return Err(EngageError::DuplicateSubtype {
                row: index,
                system_type: sub.system_type.clone(),
            });
        }
        if sub.min_pk.is_some_and(|pk| !(0.0..=1.0).contains(&pk)) {
            return Err(invalid("subtype min_pk must be within [0, 1]"));
        }
    }
    Ok(())
}
