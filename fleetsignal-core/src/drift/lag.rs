//! Thermal lag search
//!
//! A raw reading often trails the temperature that causes its drift: the
//! sensor body heats up after the air around it. The search scans candidate
//! lags, fits and applies the drift model at each one, and scores how much
//! the correction shrinks the robust spread of the signal:
//!
//! ```text
//! spread(v)     = p95(v) − p5(v)
//! reduction(ℓ)  = 100 × (spread(raw) − spread(corrected_ℓ)) / spread(raw)
//! ```
//!
//! Zero lag wins unless a candidate beats it by more than
//! `min_improvement_pct` percentage points. Among equally good lags the
//! smallest is kept.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::align::TemperatureIndex;
use super::fit::{correct_aligned, fit_drift_model, min_fit_samples};
use crate::constants::{
    DEFAULT_DRIFT_DEGREE, DEFAULT_MAX_LAG_SECONDS, DEFAULT_MAX_LAG_STEPS,
    DEFAULT_MIN_IMPROVEMENT_PCT, DEFAULT_MIN_LAG_STEP_SECONDS, SPREAD_HIGH_PERCENTILE,
    SPREAD_LOW_PERCENTILE,
};
use crate::series::Sample;

/// Lag search parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LagSearchConfig {
    /// Largest lag scanned (seconds)
    pub max_lag_seconds: f64,
    /// Smallest step between candidate lags (seconds)
    pub min_step_seconds: f64,
    /// Upper bound on the number of non-zero candidates. Zero falls back to
    /// [`DEFAULT_MAX_LAG_STEPS`] so the scan always stays bounded.
    pub max_lag_steps: usize,
    /// Percentage points a lag must beat the zero-lag baseline by
    pub min_improvement_pct: f64,
    /// Drift polynomial degree (1..=3)
    pub degree: u8,
    /// Fixed center temperature; mean aligned temperature when `None`
    pub center_temp: Option<f64>,
    /// Fit a per-day trend alongside the drift polynomial
    pub include_time_slope: bool,
    /// Clamp applied to the correction while scoring
    pub clamp_abs: Option<f64>,
}

impl Default for LagSearchConfig {
    fn default() -> Self {
        Self {
            max_lag_seconds: DEFAULT_MAX_LAG_SECONDS,
            min_step_seconds: DEFAULT_MIN_LAG_STEP_SECONDS,
            max_lag_steps: DEFAULT_MAX_LAG_STEPS,
            min_improvement_pct: DEFAULT_MIN_IMPROVEMENT_PCT,
            degree: DEFAULT_DRIFT_DEGREE,
            center_temp: None,
            include_time_slope: false,
            clamp_abs: None,
        }
    }
}

impl LagSearchConfig {
    /// Set the largest lag scanned
    pub fn with_max_lag_seconds(mut self, seconds: f64) -> Self {
        self.max_lag_seconds = seconds;
        self
    }

    /// Set the smallest lag step
    pub fn with_min_step_seconds(mut self, seconds: f64) -> Self {
        self.min_step_seconds = seconds;
        self
    }

    /// Set the candidate count ceiling
    pub fn with_max_lag_steps(mut self, steps: usize) -> Self {
        self.max_lag_steps = steps;
        self
    }

    /// Set the improvement threshold (percentage points)
    pub fn with_min_improvement_pct(mut self, pct: f64) -> Self {
        self.min_improvement_pct = pct;
        self
    }

    /// Set the drift polynomial degree
    pub fn with_degree(mut self, degree: u8) -> Self {
        self.degree = degree;
        self
    }

    /// Fix the center temperature
    pub fn with_center_temp(mut self, center_temp: f64) -> Self {
        self.center_temp = Some(center_temp);
        self
    }

    /// Fit a time trend alongside the drift
    pub fn with_time_slope(mut self, include: bool) -> Self {
        self.include_time_slope = include;
        self
    }

    /// Clamp corrections while scoring
    pub fn with_clamp_abs(mut self, clamp_abs: f64) -> Self {
        self.clamp_abs = Some(clamp_abs);
        self
    }
}

/// Score of one candidate lag
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LagCandidate {
    /// Lag applied to the temperature series (seconds)
    pub lag_seconds: f64,
    /// Spread reduction of corrected vs. raw values (percent)
    pub reduction_pct: f64,
    /// Aligned points behind the fit
    pub sample_count: usize,
}

/// Outcome of a lag search
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LagSuggestion {
    /// Chosen lag (seconds)
    pub lag_seconds: f64,
    /// Step between scanned lags (seconds)
    pub step_seconds: f64,
    /// Zero-lag score, if a fit was possible
    pub baseline: Option<LagCandidate>,
    /// Highest scoring candidate (smallest lag on ties)
    pub best: Option<LagCandidate>,
    /// Every candidate that produced a fit, in ascending lag order
    pub candidates: Vec<LagCandidate>,
}

impl LagSuggestion {
    /// Improvement of the best candidate over the baseline (percentage points)
    pub fn improvement_pct(&self) -> f64 {
        let baseline = self.baseline.map_or(0.0, |c| c.reduction_pct);
        self.best.map_or(0.0, |c| c.reduction_pct - baseline)
    }
}

/// Linear-interpolated percentile (`pct` in [0, 100]) of ascending `sorted`.
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    if !pct.is_finite() {
        return None;
    }

    let rank = pct.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lower = libm::floor(rank) as usize;
    let upper = libm::ceil(rank) as usize;
    let frac = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

fn spread(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let low = percentile(&sorted, SPREAD_LOW_PERCENTILE)?;
    let high = percentile(&sorted, SPREAD_HIGH_PERCENTILE)?;
    Some(high - low)
}

/// Percentage by which `corrected` narrows the p95−p5 spread of `raw`.
///
/// Zero when the raw spread is zero or cannot be computed; negative when the
/// correction widens the spread.
pub fn spread_reduction_pct(raw: &[f64], corrected: &[f64]) -> f64 {
    match (spread(raw), spread(corrected)) {
        (Some(raw_spread), Some(corrected_spread)) if raw_spread > 0.0 => {
            let reduction = (raw_spread - corrected_spread) / raw_spread * 100.0;
            if reduction.is_finite() {
                reduction
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Step budget actually applied: `max_lag_steps`, or the default when zero
fn effective_max_lag_steps(config: &LagSearchConfig) -> usize {
    if config.max_lag_steps == 0 {
        DEFAULT_MAX_LAG_STEPS
    } else {
        config.max_lag_steps
    }
}

/// Step between candidate lags for a series bucketed every `interval_seconds`.
///
/// At least `min_step_seconds` and the bucket interval; widened so no more
/// than `max_lag_steps` steps cover `max_lag_seconds`, and kept a whole
/// multiple of the interval so lagged timestamps still land on buckets.
pub fn lag_step_seconds(interval_seconds: f64, config: &LagSearchConfig) -> f64 {
    let interval = if interval_seconds.is_finite() && interval_seconds > 0.0 {
        interval_seconds
    } else {
        0.0
    };
    let min_step = if config.min_step_seconds.is_finite() && config.min_step_seconds > 0.0 {
        config.min_step_seconds
    } else {
        DEFAULT_MIN_LAG_STEP_SECONDS
    };

    let mut step = min_step.max(interval);
    if config.max_lag_seconds.is_finite() {
        step = step.max(config.max_lag_seconds / effective_max_lag_steps(config) as f64);
    }
    if interval > 0.0 {
        step = libm::ceil(step / interval) * interval;
    }
    step
}

fn evaluate_lag(
    index: &TemperatureIndex,
    raw: &[Sample],
    lag_seconds: f64,
    config: &LagSearchConfig,
) -> Option<LagCandidate> {
    let aligned = index.align(raw, lag_seconds);
    if aligned.len() < min_fit_samples(config.degree) {
        return None;
    }

    let fit = fit_drift_model(
        &aligned,
        config.degree,
        config.center_temp,
        config.include_time_slope,
    )?;
    let corrected = correct_aligned(&aligned, &fit, config.clamp_abs);
    let raw_values: Vec<f64> = aligned.iter().map(|p| p.raw).collect();

    Some(LagCandidate {
        lag_seconds,
        reduction_pct: spread_reduction_pct(&raw_values, &corrected),
        sample_count: aligned.len(),
    })
}

/// Suggest the thermal lag between `raw` and `temperature`.
///
/// Scans lags `0, step, 2·step, … ≤ max_lag_seconds` (see
/// [`lag_step_seconds`]), scoring each by spread reduction. Returns zero lag
/// unless the best candidate beats the baseline by more than
/// `config.min_improvement_pct`.
pub fn suggest_lag_seconds(
    raw: &[Sample],
    temperature: &[Sample],
    interval_seconds: f64,
    config: &LagSearchConfig,
) -> LagSuggestion {
    let index = TemperatureIndex::new(temperature);
    let step = lag_step_seconds(interval_seconds, config);
    let max_lag = if config.max_lag_seconds.is_finite() {
        config.max_lag_seconds.max(0.0)
    } else {
        0.0
    };

    let mut candidates = Vec::new();
    let mut baseline = None;
    let mut best: Option<LagCandidate> = None;

    let max_steps = effective_max_lag_steps(config);

    let mut k = 0usize;
    loop {
        let lag = k as f64 * step;
        if lag > max_lag || k > max_steps {
            break;
        }

        if let Some(candidate) = evaluate_lag(&index, raw, lag, config) {
            if k == 0 {
                baseline = Some(candidate);
            }
            // Strictly greater keeps the smallest lag on ties
            if best.map_or(true, |b| candidate.reduction_pct > b.reduction_pct) {
                best = Some(candidate);
            }
            candidates.push(candidate);
        }
        k += 1;
    }

    let baseline_score = baseline.map_or(0.0, |c: LagCandidate| c.reduction_pct);
    let lag_seconds = match best {
        Some(b) if b.reduction_pct - baseline_score > config.min_improvement_pct => b.lag_seconds,
        _ => 0.0,
    };

    log_debug!(
        "Lag search: {} candidates, step {}s, baseline {:.2}%, chose {}s",
        candidates.len(),
        step,
        baseline_score,
        lag_seconds
    );

    LagSuggestion {
        lag_seconds,
        step_seconds: step,
        baseline,
        best,
        candidates,
    }
}
