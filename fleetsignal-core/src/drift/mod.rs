//! Temperature Drift Compensation
//!
//! ## Overview
//!
//! Many raw sensor readings drift with their own or an ambient temperature.
//! Given a raw series and a reference temperature series, this module learns
//! that drift as a polynomial in the temperature deviation and removes it:
//!
//! ```text
//! raw ≈ c₀ + c₁·x + c₂·x² + c₃·x³ [+ s·days]      x = T − T_center
//! corrected = raw − (c₁·x + c₂·x² + c₃·x³)
//! ```
//!
//! The constant `c₀` and the optional time slope `s` are fitted but never
//! removed: only the temperature-dependent term is drift, a slow genuine
//! change in the measured quantity is preserved.
//!
//! ## Pipeline
//!
//! ```text
//! raw ──────┐
//!           ├─→ align (lag) ─→ fit ─→ correct / emit expression
//! temp ─────┘        ↑
//!                    └── lag search: scan lags, keep the one that
//!                        shrinks the p95−p5 spread most
//! ```
//!
//! 1. [`align_series_by_timestamp`]: exact-timestamp join after shifting the
//!    temperature series by a lag
//! 2. [`fit_drift_model`]: least-squares polynomial fit through the shared
//!    Gauss–Jordan solver
//! 3. [`apply_correction`]: remove the drift from a new reading
//! 4. [`suggest_lag_seconds`]: pick the thermal lag conservatively
//! 5. [`build_correction_expression`]: persist the correction as a
//!    derived-sensor formula
//!
//! ## Failure Policy
//!
//! Everything here fails soft. Too few aligned samples, a singular system or
//! non-finite intermediates produce `None`, never a panic, because previews
//! run continuously against live and gap-prone operator data.

pub mod align;
pub mod expression;
pub mod fit;
pub mod lag;

pub use align::{align_series_by_timestamp, TemperatureIndex};
pub use expression::build_correction_expression;
pub use fit::{
    apply_correction, apply_correction_clamped, correct_aligned, fit_drift_model,
    min_fit_samples, DriftFit,
};
pub use lag::{
    lag_step_seconds, percentile, spread_reduction_pct, suggest_lag_seconds, LagCandidate,
    LagSearchConfig, LagSuggestion,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A raw reading joined with the temperature observed at the lagged timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignedPoint {
    /// Timestamp of the raw reading (epoch ms)
    pub timestamp_ms: f64,
    /// Temperature matched after the lag shift
    pub temperature: f64,
    /// Raw reading
    pub raw: f64,
}

impl AlignedPoint {
    /// Create an aligned point
    pub fn new(timestamp_ms: f64, temperature: f64, raw: f64) -> Self {
        Self {
            timestamp_ms,
            temperature,
            raw,
        }
    }

    /// All three fields are finite
    pub fn is_finite(&self) -> bool {
        self.timestamp_ms.is_finite() && self.temperature.is_finite() && self.raw.is_finite()
    }
}

/// Usable clamp bound: finite and positive, anything else disables clamping.
pub(crate) fn effective_clamp(clamp_abs: Option<f64>) -> Option<f64> {
    clamp_abs.filter(|c| c.is_finite() && *c > 0.0)
}
