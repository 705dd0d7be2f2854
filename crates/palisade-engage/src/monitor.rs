//! Per-tick assignment monitors.
//!
//! Nothing here runs on its own; the caller invokes [`run`] once per tick.

use tracing::warn;

use palisade_core::AssetMap;

use crate::assignment::{AssignmentMessage, REASON_ASSIGNED_UNIT_STALE, REASON_MAX_FIRING_TIME};
use crate::book::AssignmentBook;
use crate::config::EngagementConfig;
use crate::error::EngageResult;

/// Cancel assignments whose weapon node went silent or never fired.
/// Returns the cancelled messages.
pub fn run(
    book: &mut AssignmentBook,
    assets: &mut AssetMap,
    now: f64,
    config: &EngagementConfig,
) -> EngageResult<Vec<AssignmentMessage>> {
    let mut cancelled = Vec::new();

    for (track, weapon) in book.active_keys() {
        let Some(message) = book.get(track, weapon) else {
            continue;
        };
        let assigned_unit = message.assigned_unit();

        // Step 1: stale assigned unit
        let stale = assets
            .get(assigned_unit)
            .is_some_and(|a| a.is_stale(now, config.stale_asset_time_secs));
        if stale {
            warn!(track = %track, weapon = %weapon, unit = %assigned_unit, "assigned unit stale");
            cancelled.push(book.cancel(track, weapon, now, REASON_ASSIGNED_UNIT_STALE, assets)?);
            continue;
        }

        // Step 2: no salvo within the firing window
        if message.shots_fired == 0 && message.age(now) > config.max_firing_time_secs {
            warn!(track = %track, weapon = %weapon, age = message.age(now), "max firing time exceeded");
            cancelled.push(book.cancel(track, weapon, now, REASON_MAX_FIRING_TIME, assets)?);
        }
    }

    Ok(cancelled)
}
