//! Enumeration types used throughout the decision layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tracking status of a track record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Updated by a sensor within its update interval.
    #[default]
    Active,
    /// Extrapolated without fresh sensor data.
    Coasting,
    /// Dropped by the owning asset; kept only until removed.
    Dropped,
}

/// Operational status reported by an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemStatus {
    /// Fully operational.
    #[default]
    Green,
    /// Degraded but able to accept assignments.
    Yellow,
    /// Not operational.
    Red,
}

/// Weapon category as seen by the preference table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Fighter or other airborne interceptor.
    AirIntercept,
    /// Ground-launched surface-to-air missile system.
    #[default]
    SurfaceToAir,
    /// Anything else (guns, directed energy, unclassified launchers).
    Other,
}

/// Number of munitions committed per assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotDoctrine {
    /// One missile.
    #[default]
    Shoot1,
    /// Two missiles fired together.
    Shoot2,
    /// One missile, assess, then a second if needed.
    ShootLookShoot,
}

impl ShotDoctrine {
    /// Whether one salvo launches two munitions at once.
    pub fn is_paired(self) -> bool {
        matches!(self, ShotDoctrine::Shoot2)
    }

    /// Munitions reserved when an assignment is committed.
    pub fn munitions_to_commit(self) -> u32 {
        match self {
            ShotDoctrine::Shoot1 => 1,
            ShotDoctrine::Shoot2 | ShotDoctrine::ShootLookShoot => 2,
        }
    }

    /// Shots counted when a FIRING status is received.
    pub fn shots_per_salvo(self) -> u32 {
        if self.is_paired() {
            2
        } else {
            1
        }
    }
}

/// Acknowledgement state of an assignment.
///
/// The numeric codes are the on-wire values; [`AssignmentStatus::try_from`]
/// rejects anything outside this set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    #[default]
    Unacknowledged,
    Wilco,
    Committed,
    CueTar,
    CueTtr,
    TarSearching,
    TtrSearching,
    TarTracking,
    TtrTracking,
    Firing,
    Miss,
    ChangedAssignedUnit,
    UpdatedShotDoctrine,
    Kill,
    Cancelled,
    HavcoSuccess,
    HavcoFailure,
    Cantco,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 18] = [
        AssignmentStatus::Unacknowledged,
        AssignmentStatus::Wilco,
        AssignmentStatus::Committed,
        AssignmentStatus::CueTar,
        AssignmentStatus::CueTtr,
        AssignmentStatus::TarSearching,
        AssignmentStatus::TtrSearching,
        AssignmentStatus::TarTracking,
        AssignmentStatus::TtrTracking,
        AssignmentStatus::Firing,
        AssignmentStatus::Miss,
        AssignmentStatus::ChangedAssignedUnit,
        AssignmentStatus::UpdatedShotDoctrine,
        AssignmentStatus::Kill,
        AssignmentStatus::Cancelled,
        AssignmentStatus::HavcoSuccess,
        AssignmentStatus::HavcoFailure,
        AssignmentStatus::Cantco,
    ];

    /// Terminal states end the assignment.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AssignmentStatus::Kill
                | AssignmentStatus::Cancelled
                | AssignmentStatus::HavcoSuccess
                | AssignmentStatus::HavcoFailure
                | AssignmentStatus::Cantco
        )
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            AssignmentStatus::Unacknowledged => "Unacknowledged",
            AssignmentStatus::Wilco => "Wilco",
            AssignmentStatus::Committed => "Committed",
            AssignmentStatus::CueTar => "Cue TAR",
            AssignmentStatus::CueTtr => "Cue TTR",
            AssignmentStatus::TarSearching => "TAR Searching",
            AssignmentStatus::TtrSearching => "TTR Searching",
            AssignmentStatus::TarTracking => "TAR Tracking",
            AssignmentStatus::TtrTracking => "TTR Tracking",
            AssignmentStatus::Firing => "Firing",
            AssignmentStatus::Miss => "Miss",
            AssignmentStatus::ChangedAssignedUnit => "Changed Assigned Unit",
            AssignmentStatus::UpdatedShotDoctrine => "Updated Shot Doctrine",
            AssignmentStatus::Kill => "Kill",
            AssignmentStatus::Cancelled => "Cancelled",
            AssignmentStatus::HavcoSuccess => "Havco Success",
            AssignmentStatus::HavcoFailure => "Havco Failure",
            AssignmentStatus::Cantco => "CANTCO",
        }
    }
}

impl TryFrom<u8> for AssignmentStatus {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(CoreError::InvalidStatusCode(code))
    }
}

impl FromStr for AssignmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::InvalidStatusName(s.to_string()))
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an assignment message was sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentReason {
    #[default]
    New,
    Retransmit,
    Update,
    Reassignment,
    Cancel,
}

/// Reach of a CANTCO exclusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CantcoScope {
    /// Only the responding unit is excluded from the track.
    #[default]
    Local,
    /// No unit may be assigned to the track.
    Global,
}

/// Engagement zone classification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ZoneType {
    /// Defended area.
    Da,
    /// Area of responsibility.
    Aor,
    /// Surveillance.
    Sur,
    /// Missile engagement zone.
    Mez,
    /// Fighter engagement zone.
    Fez,
    /// Joint engagement zone.
    Jez,
    /// Gun engagement zone.
    Gez,
    /// Corridor.
    Cor,
    #[default]
    Other,
}

impl ZoneType {
    pub const ALL: [ZoneType; 9] = [
        ZoneType::Other,
        ZoneType::Aor,
        ZoneType::Sur,
        ZoneType::Mez,
        ZoneType::Fez,
        ZoneType::Jez,
        ZoneType::Gez,
        ZoneType::Da,
        ZoneType::Cor,
    ];

    /// Bit used by [`crate::zone::ZoneTypeMask`].
    pub fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn name(self) -> &'static str {
        match self {
            ZoneType::Da => "DA",
            ZoneType::Aor => "AOR",
            ZoneType::Sur => "SUR",
            ZoneType::Mez => "MEZ",
            ZoneType::Fez => "FEZ",
            ZoneType::Jez => "JEZ",
            ZoneType::Gez => "GEZ",
            ZoneType::Cor => "COR",
            ZoneType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
