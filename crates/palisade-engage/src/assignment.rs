//! Assignment messages and their acknowledgement lifecycle.
//!
//! An assignment starts `Unacknowledged`, moves through any number of
//! non-terminal states reported by the weapon node, and ends in one of the
//! terminal states (or by carrying the `Cancel` reason). Once complete it
//! never changes again.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use palisade_core::enums::{AssignmentReason, AssignmentStatus, CantcoScope, ShotDoctrine};
use palisade_core::{CoreError, Identifier};

use crate::error::EngageResult;

// --- Cancellation and CANTCO reasons ---

pub const REASON_NO_SUBORDINATE_WEAPONS: &str = "no subordinate weapons";
pub const REASON_NO_WEAPON_PREFERENCE: &str = "no weapon preference";
pub const REASON_ASSIGNED_UNIT_STALE: &str = "assigned unit stale";
pub const REASON_MAX_FIRING_TIME: &str = "max firing time exceeded";

/// Latest acknowledgement reported for an assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatusMessage {
    pub status: AssignmentStatus,
    pub status_time: f64,
    pub reporting_unit: Identifier,
    #[serde(default)]
    pub cantco_reason: Option<String>,
    #[serde(default)]
    pub cantco_scope: Option<CantcoScope>,
}

/// Whether a status update changed the assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Applied,
    /// The assignment was already complete, or the update regressed it.
    Ignored,
}

/// Durable record of a weapon committed to a threat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentMessage {
    /// Track id shared across the network.
    pub reference_track_id: Identifier,
    /// Track id in the assigning unit's own numbering.
    pub local_track_id: Identifier,
    pub assigned_weapon: Identifier,
    pub assigning_unit: Identifier,
    pub initiating_unit: Identifier,
    #[serde(default)]
    pub self_defense: bool,
    /// Sent down by a commander rather than created locally.
    #[serde(default)]
    pub delegation: bool,
    #[serde(default)]
    pub shot_doctrine: ShotDoctrine,
    #[serde(default)]
    pub reason: AssignmentReason,
    #[serde(default)]
    pub shots_fired: u32,
    pub assign_time: f64,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub status: AssignmentStatusMessage,
}

impl AssignmentMessage {
    pub fn new(
        track: Identifier,
        weapon: Identifier,
        assigning_unit: Identifier,
        shot_doctrine: ShotDoctrine,
        assign_time: f64,
    ) -> Self {
        Self {
            reference_track_id: track,
            local_track_id: track,
            assigned_weapon: weapon,
            assigning_unit,
            initiating_unit: assigning_unit,
            self_defense: false,
            delegation: false,
            shot_doctrine,
            reason: AssignmentReason::New,
            shots_fired: 0,
            assign_time,
            cancel_reason: None,
            status: AssignmentStatusMessage {
                status: AssignmentStatus::Unacknowledged,
                status_time: assign_time,
                reporting_unit: assigning_unit,
                ..Default::default()
            },
        }
    }

    /// Asset that owns the assigned weapon.
    pub fn assigned_unit(&self) -> Identifier {
        Identifier::unit(self.assigned_weapon.unit)
    }

    pub fn is_complete(&self) -> bool {
        self.reason == AssignmentReason::Cancel || self.status.status.is_terminal()
    }

    /// Apply a status report from the weapon node.
    pub fn apply_status(&mut self, update: AssignmentStatusMessage) -> StatusOutcome {
        if self.is_complete() {
            warn!(
                track = %self.reference_track_id,
                weapon = %self.assigned_weapon,
                current = %self.status.status,
                rejected = %update.status,
                "status update for completed assignment ignored"
            );
            return StatusOutcome::Ignored;
        }
        if update.status == AssignmentStatus::Unacknowledged
            && self.status.status != AssignmentStatus::Unacknowledged
        {
            warn!(
                track = %self.reference_track_id,
                weapon = %self.assigned_weapon,
                current = %self.status.status,
                "status regression to Unacknowledged ignored"
            );
            return StatusOutcome::Ignored;
        }

        if update.status == AssignmentStatus::Firing {
            self.shots_fired += self.shot_doctrine.shots_per_salvo();
        }
        self.status = update;
        StatusOutcome::Applied
    }

    /// Apply a status given by its on-wire code. Unknown codes are a logic error.
    pub fn apply_status_code(
        &mut self,
        code: u8,
        status_time: f64,
        reporting_unit: Identifier,
    ) -> EngageResult<StatusOutcome> {
        let status = AssignmentStatus::try_from(code).map_err(|e: CoreError| {
            error!(
                track = %self.reference_track_id,
                weapon = %self.assigned_weapon,
                code,
                "invalid assignment status"
            );
            e
        })?;
        Ok(self.apply_status(AssignmentStatusMessage {
            status,
            status_time,
            reporting_unit,
            ..Default::default()
        }))
    }

    /// Terminate the assignment from the assigning side.
    pub fn cancel(&mut self, time: f64, reason: &str) {
        if self.is_complete() {
            return;
        }
        self.reason = AssignmentReason::Cancel;
        self.cancel_reason = Some(reason.to_string());
        self.status.status = AssignmentStatus::Cancelled;
        self.status.status_time = time;
    }

    /// Terminate the assignment because the weapon node cannot comply.
    pub fn cantco(&mut self, time: f64, reason: &str, scope: CantcoScope) -> StatusOutcome {
        let reporting_unit = self.assigned_unit();
        self.apply_status(AssignmentStatusMessage {
            status: AssignmentStatus::Cantco,
            status_time: time,
            reporting_unit,
            cantco_reason: Some(reason.to_string()),
            cantco_scope: Some(scope),
        })
    }

    /// Seconds since the assignment was made.
    pub fn age(&self, now: f64) -> f64 {
        now - self.assign_time
    }
}
