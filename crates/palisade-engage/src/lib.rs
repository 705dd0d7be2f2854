//! Engagement assessment for PALISADE.
//!
//! Weapon preference lookup, per-pair feasibility and scoring, threat
//! allocation (fastest intercept or globally optimal), the assignment
//! lifecycle, and the per-tick assignment monitors. Everything operates on
//! the identifier-keyed records from `palisade-core`; nothing here touches a
//! transport or a clock.

pub mod assessor;
pub mod assignment;
pub mod book;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod intercept;
pub mod monitor;
pub mod pairing;
pub mod threat;
pub mod weapon_table;

pub use palisade_core as core;

pub use assessor::{
    allocate, allocate_optimal, assess, prioritize_pairings, Allocation, AllocationOutcome,
    Assessment,
};
pub use assignment::{AssignmentMessage, AssignmentStatusMessage, StatusOutcome};
pub use book::AssignmentBook;
pub use config::{AllocationStrategy, EngagementConfig, ScoringWeights};
pub use error::{EngageError, EngageResult};
pub use exclusion::ExclusionList;
pub use intercept::KinematicInterceptCalculator;
pub use pairing::{compute_score, evaluate, PairingContext, PairingFailure, WeaponPairing};
pub use threat::Threat;
pub use weapon_table::{TargetQuery, WeaponPreferenceRow, WeaponTable};
