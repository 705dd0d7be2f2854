//! Physical constants and default tuning parameters.

// --- Earth model ---

/// WGS-84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Mean Earth radius used for great-circle computations (meters).
pub const EARTH_MEAN_RADIUS: f64 = 6_371_000.0;

/// Meters per degree of latitude (nearly constant across the globe).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

// --- Asset readiness ---

/// An asset that has not reported within this window is considered stale (seconds).
pub const DEFAULT_STALE_ASSET_TIME_SECS: f64 = 60.0;

/// An assignment open this long without a salvo is cancelled (seconds).
pub const DEFAULT_MAX_FIRING_TIME_SECS: f64 = 360.0;

// --- Scoring ---

/// Upper bound of every normalized scoring term and of the composite score.
pub const MAX_SCORE: f64 = 10.0;

/// Threat ranks at or beyond this value contribute nothing to the target-priority term.
pub const TARGET_PRIORITY_CEILING: u32 = 11;

// --- Intercept ---

/// Relative closing speeds at or below this are treated as no solution (m/s).
pub const MIN_CLOSING_SPEED: f64 = 1e-6;
