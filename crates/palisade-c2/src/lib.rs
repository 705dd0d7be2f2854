//! C2 dissemination for PALISADE.
//!
//! Message categories and envelopes, the per-category routing table, and
//! the router that turns one outgoing message into point-to-point copies
//! by walking the command hierarchy. Delivery belongs to the transport.

pub mod error;
pub mod messages;
pub mod router;

pub use palisade_core as core;

pub use error::{RouteError, RouteResult};
pub use messages::{CueMessage, Envelope, MessageCategory, Payload, StatusMessage, TrackUpdateMessage};
pub use router::{DisseminationRouter, DynamicStyle, RoutingConfig, RoutingPolicies};

#[cfg(test)]
mod tests;
