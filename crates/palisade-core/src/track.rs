//! Track records and constant-velocity extrapolation.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::TrackStatus;
use crate::geometry;
use crate::types::{Identifier, Position};

/// Ground-truth metadata carried alongside a track for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetTruth {
    pub platform_name: String,
    pub side: String,
}

/// A positioned, moving object reported by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Identifier,
    /// Time of the last sensor update (seconds).
    pub update_time: f64,
    /// Expected interval between sensor updates (seconds).
    #[serde(default)]
    pub update_interval: f64,
    #[serde(default)]
    pub status: TrackStatus,
    pub position: Position,
    /// Velocity in ECEF (m/s).
    pub velocity: DVec3,
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub target_subtype: String,
    /// Row-major 3x3 position covariance (m²).
    #[serde(default)]
    pub covariance: Option<[f64; 9]>,
    #[serde(default)]
    pub truth: Option<TargetTruth>,
}

impl Track {
    pub fn new(id: Identifier, update_time: f64, position: Position, velocity: DVec3) -> Self {
        Self {
            id,
            update_time,
            update_interval: 0.0,
            status: TrackStatus::Active,
            position,
            velocity,
            target_type: String::new(),
            target_subtype: String::new(),
            covariance: None,
            truth: None,
        }
    }

    /// Build a track whose velocity is given in the local east/north/up frame.
    pub fn with_enu_velocity(
        id: Identifier,
        update_time: f64,
        position: Position,
        east: f64,
        north: f64,
        up: f64,
    ) -> Self {
        let (e, n, u) = geometry::enu_basis(position.lat_rad(), position.lon_rad());
        Self::new(id, update_time, position, e * east + n * north + u * up)
    }

    pub fn with_type(mut self, target_type: &str, target_subtype: &str) -> Self {
        self.target_type = target_type.to_string();
        self.target_subtype = target_subtype.to_string();
        self
    }

    /// Speed magnitude (m/s).
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Climb rate along the local vertical (m/s).
    pub fn vertical_speed(&self) -> f64 {
        self.velocity.dot(self.position.up())
    }

    /// Heading in radians (0 = North, clockwise).
    pub fn heading(&self) -> f64 {
        let (e, n, _) = geometry::enu_basis(self.position.lat_rad(), self.position.lon_rad());
        self.velocity
            .dot(e)
            .atan2(self.velocity.dot(n))
            .rem_euclid(std::f64::consts::TAU)
    }

    /// Copy of this track propagated to `time`. The authoritative record is
    /// left untouched.
    pub fn extrapolated(&self, time: f64) -> Track {
        let mut track = self.clone();
        track.extrapolate_in_place(time);
        track
    }

    /// Advance this record to `time`. Only the owning asset should call this.
    pub fn extrapolate_in_place(&mut self, time: f64) {
        let dt = time - self.update_time;
        if dt != 0.0 {
            self.position = extrapolate_position(&self.position, self.velocity, dt);
        }
        self.update_time = time;
    }
}

/// Constant-velocity propagation with an earth-curvature altitude correction.
///
/// A straight ECEF line rises away from the curved surface; the altitude is
/// therefore taken from the vertical velocity component alone so that level
/// flight stays level.
pub fn extrapolate_position(position: &Position, velocity: DVec3, dt: f64) -> Position {
    let straight = Position::from_ecef(position.ecef() + velocity * dt);
    let climb = velocity.dot(position.up()) * dt;
    straight.with_altitude(position.alt_m() + climb)
}
