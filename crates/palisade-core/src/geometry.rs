//! Geometry primitives: geodetic conversions, great-circle math, and planar
//! polygon helpers. Pure functions, no state.
//!
//! Angles are radians unless a name says otherwise. Planar helpers work in a
//! local east/north frame in meters produced by [`LocalProjection`].

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::{DVec2, DVec3};

use crate::constants::{EARTH_MEAN_RADIUS, METERS_PER_DEGREE, WGS84_A, WGS84_E2};

/// Geodetic (lat, lon, alt) to ECEF.
pub fn geodetic_to_ecef(lat: f64, lon: f64, alt: f64) -> DVec3 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    DVec3::new(
        (n + alt) * cos_lat * cos_lon,
        (n + alt) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + alt) * sin_lat,
    )
}

/// ECEF to geodetic (lat, lon, alt) by fixed-point iteration on latitude.
pub fn ecef_to_geodetic(p: DVec3) -> (f64, f64, f64) {
    let lon = p.y.atan2(p.x);
    let rho = (p.x * p.x + p.y * p.y).sqrt();

    if rho < 1e-6 {
        let b = WGS84_A * (1.0 - WGS84_E2).sqrt();
        let lat = if p.z >= 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
        return (lat, lon, p.z.abs() - b);
    }

    let mut lat = (p.z / (rho * (1.0 - WGS84_E2))).atan();
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let alt = rho / lat.cos() - n;
        let next = (p.z / (rho * (1.0 - WGS84_E2 * n / (n + alt)))).atan();
        if (next - lat).abs() < 1e-13 {
            lat = next;
            break;
        }
        lat = next;
    }

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = rho / lat.cos() - n;
    (lat, lon, alt)
}

/// Local (east, north, up) unit vectors expressed in ECEF.
pub fn enu_basis(lat: f64, lon: f64) -> (DVec3, DVec3, DVec3) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let east = DVec3::new(-sin_lon, cos_lon, 0.0);
    let north = DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
    let up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
    (east, north, up)
}

/// Great-circle (haversine) distance in meters on the mean-radius sphere.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS * a.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing in radians (0 = North, clockwise), in [0, 2π).
pub fn great_circle_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlon = lon2 - lon1;
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).rem_euclid(TAU)
}

/// Destination reached from (lat, lon) after `distance` meters on `bearing`.
pub fn great_circle_destination(lat: f64, lon: f64, bearing: f64, distance: f64) -> (f64, f64) {
    let delta = distance / EARTH_MEAN_RADIUS;
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_d, cos_d) = delta.sin_cos();
    let lat2 = (sin_lat * cos_d + cos_lat * sin_d * bearing.cos()).asin();
    let lon2 = lon + (bearing.sin() * sin_d * cos_lat).atan2(cos_d - sin_lat * lat2.sin());
    (lat2, normalize_lon(lon2))
}

/// Wrap a longitude in radians into [-π, π).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + std::f64::consts::PI).rem_euclid(TAU) - std::f64::consts::PI
}

/// Even-odd point-in-polygon test. Vertices are implicitly closed.
pub fn point_in_polygon(point: DVec2, vertices: &[DVec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Closest point to `p` on segment `a`-`b`, and its parameter t in [0, 1].
pub fn project_point_to_segment(p: DVec2, a: DVec2, b: DVec2) -> (DVec2, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Distance along a ray (origin + t * dir, t >= 0) to segment `a`-`b`, if they meet.
pub fn ray_segment_intersection(origin: DVec2, dir: DVec2, a: DVec2, b: DVec2) -> Option<f64> {
    let edge = b - a;
    let denom = dir.perp_dot(edge);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let diff = a - origin;
    let t = diff.perp_dot(edge) / denom;
    let u = diff.perp_dot(dir) / denom;
    (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
}

/// Whether a ray (origin + t * dir, t >= 0) passes within `radius` of `center`.
pub fn ray_hits_circle(origin: DVec2, dir: DVec2, center: DVec2, radius: f64) -> bool {
    let to_center = center - origin;
    if to_center.length() <= radius {
        return true;
    }
    let len = dir.length();
    if len <= f64::EPSILON {
        return false;
    }
    let unit = dir / len;
    let along = to_center.dot(unit);
    if along < 0.0 {
        return false;
    }
    let closest = origin + unit * along;
    closest.distance(center) <= radius
}

/// Equirectangular projection anchored at a reference point.
///
/// Maps lat/lon (degrees) to a local east/north plane in meters. Accurate to
/// well under 1% within a few hundred kilometers of the reference point,
/// which covers every zone and terrain query this crate performs.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    /// Reference latitude in degrees.
    pub ref_lat: f64,
    /// Reference longitude in degrees.
    pub ref_lon: f64,
    cos_ref_lat: f64,
}

impl LocalProjection {
    /// Create a projection centered at the given lat/lon (degrees).
    pub fn new(ref_lat: f64, ref_lon: f64) -> Self {
        Self {
            ref_lat,
            ref_lon,
            cos_ref_lat: ref_lat.to_radians().cos(),
        }
    }

    /// Lat/lon in degrees to local (east, north) meters.
    pub fn to_local(&self, lat: f64, lon: f64) -> DVec2 {
        let dlon = (lon - self.ref_lon + 540.0).rem_euclid(360.0) - 180.0;
        DVec2::new(
            dlon * METERS_PER_DEGREE * self.cos_ref_lat,
            (lat - self.ref_lat) * METERS_PER_DEGREE,
        )
    }

    /// Local (east, north) meters back to lat/lon in degrees.
    pub fn to_geo(&self, local: DVec2) -> (f64, f64) {
        let lon = self.ref_lon + local.x / (METERS_PER_DEGREE * self.cos_ref_lat);
        let lat = self.ref_lat + local.y / METERS_PER_DEGREE;
        (lat, lon)
    }
}
