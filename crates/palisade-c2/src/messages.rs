//! Outgoing message payloads and routed envelopes.

use serde::{Deserialize, Serialize};

use palisade_core::enums::SystemStatus;
use palisade_core::{Identifier, Track};
use palisade_engage::AssignmentMessage;

/// Routing category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Assignment,
    AssignmentCancel,
    AssignmentStatus,
    Cue,
    TrackAssignmentUpdate,
    TrackUpdate,
    Status,
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 7] = [
        MessageCategory::Assignment,
        MessageCategory::AssignmentCancel,
        MessageCategory::AssignmentStatus,
        MessageCategory::Cue,
        MessageCategory::TrackAssignmentUpdate,
        MessageCategory::TrackUpdate,
        MessageCategory::Status,
    ];
}

/// Request for a sensor to look at a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueMessage {
    pub reference_track_id: Identifier,
    pub cued_unit: Identifier,
    pub initiating_unit: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackUpdateMessage {
    pub track: Track,
    /// Addressee for assignment-related track updates.
    #[serde(default)]
    pub destination: Option<Identifier>,
}

/// Readiness report sent up the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub asset: Identifier,
    pub status: SystemStatus,
    pub open_assignments: u32,
    pub max_assignments: u32,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Assignment(AssignmentMessage),
    AssignmentCancel(AssignmentMessage),
    AssignmentStatus(AssignmentMessage),
    Cue(CueMessage),
    TrackAssignmentUpdate(TrackUpdateMessage),
    TrackUpdate(TrackUpdateMessage),
    Status(StatusMessage),
}

impl Payload {
    pub fn category(&self) -> MessageCategory {
        match self {
            Payload::Assignment(_) => MessageCategory::Assignment,
            Payload::AssignmentCancel(_) => MessageCategory::AssignmentCancel,
            Payload::AssignmentStatus(_) => MessageCategory::AssignmentStatus,
            Payload::Cue(_) => MessageCategory::Cue,
            Payload::TrackAssignmentUpdate(_) => MessageCategory::TrackAssignmentUpdate,
            Payload::TrackUpdate(_) => MessageCategory::TrackUpdate,
            Payload::Status(_) => MessageCategory::Status,
        }
    }

    /// The unit this message is ultimately meant for, if it has one.
    ///
    /// Assignments and cancels go to the weapon's owner; status replies go
    /// back to the assigning unit. Track updates and status reports are
    /// disseminated by policy only.
    pub fn semantic_destination(&self) -> Option<Identifier> {
        match self {
            Payload::Assignment(m) | Payload::AssignmentCancel(m) => Some(m.assigned_unit()),
            Payload::AssignmentStatus(m) => Some(m.assigning_unit),
            Payload::Cue(c) => Some(c.cued_unit),
            Payload::TrackAssignmentUpdate(t) => t.destination,
            Payload::TrackUpdate(_) | Payload::Status(_) => None,
        }
    }
}

/// One routed, point-to-point copy of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: Identifier,
    pub destination: Identifier,
    /// Always false: routing here is point-to-point.
    pub broadcast: bool,
    pub transmit_time: f64,
    pub payload: Payload,
}
