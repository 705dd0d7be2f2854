//! Fundamental identifier, position, and simulation time types.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry;

/// Identifier of an asset, weapon, or track within a unit.
///
/// Ordering is lexicographic on (unit, sub), which makes every arena keyed
/// by identifier iterate deterministically.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Identifier {
    /// Owning unit id.
    pub unit: u32,
    /// Sub-id within the unit (0 for the unit itself).
    #[serde(default)]
    pub sub: u32,
}

impl Identifier {
    pub const fn new(unit: u32, sub: u32) -> Self {
        Self { unit, sub }
    }

    /// Identifier naming a whole unit.
    pub const fn unit(unit: u32) -> Self {
        Self { unit, sub: 0 }
    }

    /// Unit id 0 is reserved as "unset".
    pub fn is_valid(&self) -> bool {
        self.unit != 0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.unit, self.sub)
    }
}

/// Serialized form of a [`Position`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Geodetic latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lon_deg: f64,
    /// Altitude above the ellipsoid in meters.
    #[serde(default)]
    pub alt_m: f64,
}

/// Geodetic position with a cached Earth-centered Earth-fixed form.
///
/// The two representations are kept consistent by construction: the only
/// ways to build a `Position` are [`Position::from_lla`] and
/// [`Position::from_ecef`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "GeoPoint", into = "GeoPoint")]
pub struct Position {
    lat_deg: f64,
    lon_deg: f64,
    alt_m: f64,
    ecef: DVec3,
}

impl Position {
    pub fn from_lla(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        let ecef = geometry::geodetic_to_ecef(lat_deg.to_radians(), lon_deg.to_radians(), alt_m);
        Self {
            lat_deg,
            lon_deg,
            alt_m,
            ecef,
        }
    }

    pub fn from_ecef(ecef: DVec3) -> Self {
        let (lat, lon, alt_m) = geometry::ecef_to_geodetic(ecef);
        Self {
            lat_deg: lat.to_degrees(),
            lon_deg: lon.to_degrees(),
            alt_m,
            ecef,
        }
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_deg
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_deg
    }

    pub fn alt_m(&self) -> f64 {
        self.alt_m
    }

    pub fn lat_rad(&self) -> f64 {
        self.lat_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.lon_deg.to_radians()
    }

    /// Earth-centered Earth-fixed coordinates (meters).
    pub fn ecef(&self) -> DVec3 {
        self.ecef
    }

    /// Same horizontal location at a different altitude.
    pub fn with_altitude(&self, alt_m: f64) -> Self {
        Self::from_lla(self.lat_deg, self.lon_deg, alt_m)
    }

    /// Straight-line (slant) range in meters.
    pub fn slant_range_to(&self, other: &Position) -> f64 {
        (other.ecef - self.ecef).length()
    }

    /// Great-circle ground range in meters, ignoring altitude.
    pub fn ground_range_to(&self, other: &Position) -> f64 {
        geometry::great_circle_distance(
            self.lat_rad(),
            self.lon_rad(),
            other.lat_rad(),
            other.lon_rad(),
        )
    }

    /// Initial great-circle bearing in radians (0 = North, clockwise).
    pub fn bearing_to(&self, other: &Position) -> f64 {
        geometry::great_circle_bearing(
            self.lat_rad(),
            self.lon_rad(),
            other.lat_rad(),
            other.lon_rad(),
        )
    }

    /// Local geodetic up unit vector in ECEF.
    pub fn up(&self) -> DVec3 {
        geometry::enu_basis(self.lat_rad(), self.lon_rad()).2
    }

    /// Position displaced along the great circle by `distance_m` on `bearing_rad`.
    pub fn moved(&self, bearing_rad: f64, distance_m: f64, alt_m: f64) -> Self {
        let (lat, lon) =
            geometry::great_circle_destination(self.lat_rad(), self.lon_rad(), bearing_rad, distance_m);
        Self::from_lla(lat.to_degrees(), lon.to_degrees(), alt_m)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::from_lla(0.0, 0.0, 0.0)
    }
}

impl From<GeoPoint> for Position {
    fn from(p: GeoPoint) -> Self {
        Self::from_lla(p.lat_deg, p.lon_deg, p.alt_m)
    }
}

impl From<Position> for GeoPoint {
    fn from(p: Position) -> Self {
        Self {
            lat_deg: p.lat_deg,
            lon_deg: p.lon_deg,
            alt_m: p.alt_m,
        }
    }
}
