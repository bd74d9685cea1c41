//! Constants for FleetSignal Core
//!
//! Numeric defaults and thresholds used by the filter and the drift model,
//! kept in one place so option structs and tests agree on them.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: f64 = 1000.0;

/// Seconds per day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Milliseconds per day. The drift model's time-detrend term is per day.
pub const MS_PER_DAY: f64 = MS_PER_SECOND * SECONDS_PER_DAY;

// ===== LINEAR ALGEBRA =====

/// Smallest pivot magnitude accepted by the Gauss–Jordan solver.
///
/// Anything below this is treated as a singular system. Savitzky–Golay
/// normal matrices hold integer power sums, so legitimate pivots are far
/// above this even for wide windows.
pub const SINGULAR_PIVOT_EPSILON: f64 = 1e-12;

// ===== SAVITZKY–GOLAY DEFAULTS =====

/// Default window length (samples). Must be odd.
pub const DEFAULT_WINDOW_LENGTH: usize = 7;

/// Default polynomial order fitted inside each window.
pub const DEFAULT_POLY_ORDER: usize = 2;

/// Smallest window the filter accepts.
pub const MIN_WINDOW_LENGTH: usize = 3;

// ===== DRIFT MODEL =====

/// Minimum aligned samples for any drift fit, regardless of degree.
pub const MIN_FIT_SAMPLES: usize = 10;

/// Highest supported drift polynomial degree.
pub const MAX_DRIFT_DEGREE: u8 = 3;

/// Lowest percentile of the spread score.
pub const SPREAD_LOW_PERCENTILE: f64 = 5.0;

/// Highest percentile of the spread score.
pub const SPREAD_HIGH_PERCENTILE: f64 = 95.0;

// ===== LAG SEARCH =====

/// Smallest lag step scanned (seconds).
///
/// Bucketed series finer than five minutes still scan in five minute steps,
/// which keeps preview searches interactive.
pub const DEFAULT_MIN_LAG_STEP_SECONDS: f64 = 300.0;

/// Largest lag scanned by default (seconds): six hours.
pub const DEFAULT_MAX_LAG_SECONDS: f64 = 6.0 * 3600.0;

/// Upper bound on lag candidates per search; the step widens to respect it.
pub const DEFAULT_MAX_LAG_STEPS: usize = 96;

/// Percentage points a lagged candidate must beat the zero-lag baseline by.
pub const DEFAULT_MIN_IMPROVEMENT_PCT: f64 = 5.0;

/// Default drift polynomial degree for lag search.
pub const DEFAULT_DRIFT_DEGREE: u8 = 1;
