/// Minimum tracker confidence for a sample to count as valid.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

/// Seconds of steady gaze before the fill indicator appears.
pub const DEFAULT_PRE_HOLD_SECS: f64 = 2.0;

/// Seconds for the fill indicator to go from empty to full.
pub const DEFAULT_FILL_SECS: f64 = 3.0;

/// Floor for the fill duration, keeps progress finite.
pub const MIN_FILL_SECS: f64 = 0.001;

/// Maximum ray length (world units) for both hit tiers.
pub const DEFAULT_MAX_DISTANCE: f64 = 10.0;

/// Granularity of the advisory dwell counter.
pub const DWELL_COUNTER_INTERVAL_SECS: f64 = 1.0;

/// Hover highlight scale target.
pub const DEFAULT_HIGHLIGHT_SCALE: f64 = 1.06;

/// Hover highlight easing rate (per second).
pub const DEFAULT_HIGHLIGHT_LERP_SPEED: f64 = 12.0;

/// Depth of the box collider generated for each tile.
pub const TILE_COLLIDER_THICKNESS: f64 = 0.01;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-10;
