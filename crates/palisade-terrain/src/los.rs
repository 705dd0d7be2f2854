//! Line-of-sight calculation with terrain occlusion.
//!
//! Uses stepped ray traversal with Earth curvature correction
//! and standard atmospheric refraction (4/3 Earth radius model).

use palisade_core::constants::EARTH_MEAN_RADIUS;
use palisade_core::geometry::LocalProjection;
use palisade_core::services::TerrainQuery;
use palisade_core::Position;
use tracing::trace;

use crate::grid::TerrainGrid;

/// Effective Earth radius accounting for standard atmospheric refraction (4/3 model).
const EFFECTIVE_EARTH_RADIUS: f64 = EARTH_MEAN_RADIUS * 4.0 / 3.0;

/// Sample interval along the ray (meters).
const LOS_SAMPLE_INTERVAL: f64 = 100.0;

/// Whether the straight path between `from` and `to` clears the terrain.
///
/// Samples outside the grid count as sea level. Altitudes are measured from
/// the curved surface, so between the endpoints the ground bulges up
/// toward the straight ray.
pub fn has_line_of_sight(grid: &TerrainGrid, from: &Position, to: &Position) -> bool {
    let projection = LocalProjection::new(from.lat_deg(), from.lon_deg());
    let offset = projection.to_local(to.lat_deg(), to.lon_deg());
    let horiz_dist = offset.length();

    if horiz_dist < LOS_SAMPLE_INTERVAL {
        return true; // Too close for terrain to matter
    }

    let num_samples = ((horiz_dist / LOS_SAMPLE_INTERVAL).ceil() as usize).max(2);
    let dz = to.alt_m() - from.alt_m();

    for i in 1..num_samples {
        let t = i as f64 / num_samples as f64;
        let (lat, lon) = projection.to_geo(offset * t);

        let ray_height = from.alt_m() + dz * t;

        let d_from = horiz_dist * t;
        let d_to = horiz_dist * (1.0 - t);
        let earth_bulge = (d_from * d_to) / (2.0 * EFFECTIVE_EARTH_RADIUS);

        let terrain_elev = grid.elevation_at_geo(lat, lon).unwrap_or(0.0);
        if terrain_elev + earth_bulge > ray_height {
            trace!(lat, lon, terrain_elev, ray_height, "line of sight blocked");
            return false;
        }
    }

    true
}

impl TerrainQuery for TerrainGrid {
    fn is_line_of_sight_masked(&self, observer: &Position, target: &Position) -> bool {
        !has_line_of_sight(self, observer, target)
    }
}
