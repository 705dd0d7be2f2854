//! Engagement zones: circular (optionally domed) or polygonal regions with
//! optional floor and ceiling, plus containment, distance, closest-point,
//! and heading-projection queries.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::ZoneType;
use crate::error::{CoreError, CoreResult};
use crate::geometry::{self, LocalProjection};
use crate::types::Position;

/// Polygon vertex in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoVertex {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoVertex {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

/// Zone footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ZoneShape {
    Circular {
        center: Position,
        radius_m: f64,
        /// A domed zone is a hemisphere of `radius_m` above the center.
        #[serde(default)]
        dome: bool,
    },
    Polygonal {
        /// Ordered (lon, lat) vertices, implicitly closed.
        vertices: Vec<GeoVertex>,
    },
}

/// A named engagement region. Immutable after configuration load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub priority: i32,
    #[serde(flatten)]
    pub shape: ZoneShape,
    /// Lowest altitude inside the zone (meters).
    #[serde(default)]
    pub floor_m: Option<f64>,
    /// Highest altitude inside the zone (meters).
    #[serde(default)]
    pub ceiling_m: Option<f64>,
}

impl Zone {
    pub fn circular(name: &str, zone_type: ZoneType, center: Position, radius_m: f64) -> Self {
        Self {
            name: name.to_string(),
            zone_type,
            priority: 0,
            shape: ZoneShape::Circular {
                center,
                radius_m,
                dome: false,
            },
            floor_m: None,
            ceiling_m: None,
        }
    }

    pub fn dome(name: &str, zone_type: ZoneType, center: Position, radius_m: f64) -> Self {
        Self {
            shape: ZoneShape::Circular {
                center,
                radius_m,
                dome: true,
            },
            ..Self::circular(name, zone_type, center, radius_m)
        }
    }

    pub fn polygonal(name: &str, zone_type: ZoneType, vertices: Vec<GeoVertex>) -> CoreResult<Self> {
        let zone = Self {
            name: name.to_string(),
            zone_type,
            priority: 0,
            shape: ZoneShape::Polygonal { vertices },
            floor_m: None,
            ceiling_m: None,
        };
        zone.validate()?;
        Ok(zone)
    }

    /// Restrict the zone to an altitude band.
    pub fn with_altitude_band(mut self, floor_m: Option<f64>, ceiling_m: Option<f64>) -> Self {
        self.floor_m = floor_m;
        self.ceiling_m = ceiling_m;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Reject shapes that cannot contain anything.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::InvalidZone {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        match &self.shape {
            ZoneShape::Circular { radius_m, .. } if radius_m.is_nan() || *radius_m <= 0.0 => {
                return Err(invalid("radius must be positive"));
            }
            ZoneShape::Polygonal { vertices } if vertices.len() < 3 => {
                return Err(invalid("polygon needs at least three vertices"));
            }
            _ => {}
        }
        if let (Some(floor), Some(ceiling)) = (self.floor_m, self.ceiling_m) {
            if floor > ceiling {
                return Err(invalid("floor is above ceiling"));
            }
        }
        Ok(())
    }

    /// Whether `pos` lies inside the zone volume.
    pub fn contains(&self, pos: &Position) -> bool {
        self.footprint_contains(pos) && self.vertical_gap(pos.alt_m()) == 0.0
    }

    /// Distance in meters from `pos` to the zone volume, 0 when inside.
    pub fn distance_to(&self, pos: &Position) -> f64 {
        if let ZoneShape::Circular {
            center,
            radius_m,
            dome: true,
        } = &self.shape
        {
            let outside = (center.slant_range_to(pos) - radius_m).max(0.0);
            let below = (center.alt_m() - pos.alt_m()).max(0.0);
            return outside.max(below).max(self.vertical_gap(pos.alt_m()));
        }
        let horizontal = self.footprint_distance(pos);
        let vertical = self.vertical_gap(pos.alt_m());
        horizontal.hypot(vertical)
    }

    /// Nearest point of the zone to `pos`; `pos` itself when inside.
    pub fn closest_point(&self, pos: &Position) -> Position {
        if self.contains(pos) {
            return *pos;
        }
        let alt = self.clamp_altitude(pos.alt_m());
        match &self.shape {
            ZoneShape::Circular {
                center,
                radius_m,
                dome: true,
            } => {
                let offset = pos.ecef() - center.ecef();
                let len = offset.length();
                if len > f64::EPSILON && pos.alt_m() >= center.alt_m() {
                    return Position::from_ecef(center.ecef() + offset * (radius_m / len).min(1.0));
                }
                // Below the dome base: nearest point is on the base disc.
                if center.ground_range_to(pos) <= *radius_m {
                    return pos.with_altitude(center.alt_m());
                }
                center.moved(center.bearing_to(pos), *radius_m, center.alt_m())
            }
            ZoneShape::Circular {
                center, radius_m, ..
            } => {
                let ground = center.ground_range_to(pos);
                if ground <= *radius_m {
                    return pos.with_altitude(alt);
                }
                center.moved(center.bearing_to(pos), *radius_m, alt)
            }
            ZoneShape::Polygonal { vertices } => {
                let proj = LocalProjection::new(pos.lat_deg(), pos.lon_deg());
                let local = to_local(&proj, vertices);
                if geometry::point_in_polygon(DVec2::ZERO, &local) {
                    return pos.with_altitude(alt);
                }
                let nearest = nearest_on_boundary(DVec2::ZERO, &local);
                let (lat, lon) = proj.to_geo(nearest);
                Position::from_lla(lat, lon, alt)
            }
        }
    }

    /// Whether a track at `pos` flying on `heading_rad` is inside the zone
    /// footprint or will cross it if it holds its heading.
    pub fn is_projected_inside(&self, pos: &Position, heading_rad: f64) -> bool {
        if self.footprint_contains(pos) {
            return true;
        }
        let dir = DVec2::new(heading_rad.sin(), heading_rad.cos());
        let proj = LocalProjection::new(pos.lat_deg(), pos.lon_deg());
        match &self.shape {
            ZoneShape::Circular {
                center, radius_m, ..
            } => {
                let c = proj.to_local(center.lat_deg(), center.lon_deg());
                geometry::ray_hits_circle(DVec2::ZERO, dir, c, *radius_m)
            }
            ZoneShape::Polygonal { vertices } => {
                let local = to_local(&proj, vertices);
                let crosses = edges(&local).any(|(a, b)| {
                    geometry::ray_segment_intersection(DVec2::ZERO, dir, a, b).is_some()
                });
                crosses
            }
        }
    }

    fn footprint_contains(&self, pos: &Position) -> bool {
        match &self.shape {
            ZoneShape::Circular {
                center,
                radius_m,
                dome,
            } => {
                if *dome {
                    pos.alt_m() >= center.alt_m() && center.slant_range_to(pos) <= *radius_m
                } else {
                    center.ground_range_to(pos) <= *radius_m
                }
            }
            ZoneShape::Polygonal { vertices } => {
                let proj = LocalProjection::new(pos.lat_deg(), pos.lon_deg());
                geometry::point_in_polygon(DVec2::ZERO, &to_local(&proj, vertices))
            }
        }
    }

    fn footprint_distance(&self, pos: &Position) -> f64 {
        match &self.shape {
            ZoneShape::Circular {
                center, radius_m, ..
            } => (center.ground_range_to(pos) - radius_m).max(0.0),
            ZoneShape::Polygonal { vertices } => {
                let proj = LocalProjection::new(pos.lat_deg(), pos.lon_deg());
                let local = to_local(&proj, vertices);
                if geometry::point_in_polygon(DVec2::ZERO, &local) {
                    0.0
                } else {
                    nearest_on_boundary(DVec2::ZERO, &local).length()
                }
            }
        }
    }

    fn vertical_gap(&self, alt: f64) -> f64 {
        let below = self.floor_m.map_or(0.0, |f| (f - alt).max(0.0));
        let above = self.ceiling_m.map_or(0.0, |c| (alt - c).max(0.0));
        below.max(above)
    }

    fn clamp_altitude(&self, alt: f64) -> f64 {
        let alt = self.floor_m.map_or(alt, |f| alt.max(f));
        self.ceiling_m.map_or(alt, |c| alt.min(c))
    }
}

fn to_local(proj: &LocalProjection, vertices: &[GeoVertex]) -> Vec<DVec2> {
    vertices
        .iter()
        .map(|v| proj.to_local(v.lat_deg, v.lon_deg))
        .collect()
}

fn edges(local: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    (0..local.len()).map(move |i| (local[i], local[(i + 1) % local.len()]))
}

fn nearest_on_boundary(p: DVec2, local: &[DVec2]) -> DVec2 {
    edges(local)
        .map(|(a, b)| geometry::project_point_to_segment(p, a, b).0)
        .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
        .unwrap_or(p)
}

/// Set of [`ZoneType`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneTypeMask(u16);

impl ZoneTypeMask {
    pub const EMPTY: ZoneTypeMask = ZoneTypeMask(0);

    pub fn of(zone_type: ZoneType) -> Self {
        Self(zone_type.bit())
    }

    pub fn insert(&mut self, zone_type: ZoneType) {
        self.0 |= zone_type.bit();
    }

    pub fn contains(&self, zone_type: ZoneType) -> bool {
        self.0 & zone_type.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn intersects(&self, other: ZoneTypeMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: ZoneTypeMask) -> Self {
        Self(self.0 | other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = ZoneType> {
        let mask = *self;
        ZoneType::ALL.into_iter().filter(move |t| mask.contains(*t))
    }

    /// Types of every zone in `zones` that contains `pos`; `fallback` when
    /// there are no zones at all.
    pub fn containing(zones: &[Zone], pos: &Position, fallback: ZoneType) -> Self {
        if zones.is_empty() {
            return Self::of(fallback);
        }
        zones
            .iter()
            .filter(|z| z.contains(pos))
            .map(|z| z.zone_type)
            .collect()
    }
}

impl FromIterator<ZoneType> for ZoneTypeMask {
    fn from_iter<I: IntoIterator<Item = ZoneType>>(iter: I) -> Self {
        let mut mask = ZoneTypeMask::EMPTY;
        for t in iter {
            mask.insert(t);
        }
        mask
    }
}

impl fmt::Display for ZoneTypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ZoneType::name).collect();
        f.write_str(&names.join(","))
    }
}
