//! Polynomial drift fit and correction
//!
//! ## Model
//!
//! ```text
//! raw = c₀ + Σₖ cₖ·xᵏ [+ s·d]      x = T − T_center,  d = (t − t_center) / 1 day
//! ```
//!
//! Solved through the normal equations with [`crate::linalg::solve`], the
//! same pivoted Gauss–Jordan routine the Savitzky–Golay filter uses. The
//! system is at most 5×5 (cubic plus time slope).
//!
//! ## Quality
//!
//! R² compares the full model's residuals against the raw variance. It is
//! reported as `None` when the raw series is flat (no variance to explain)
//! or when any sum goes non-finite.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{effective_clamp, expression, AlignedPoint};
use crate::constants::{MAX_DRIFT_DEGREE, MIN_FIT_SAMPLES, MS_PER_DAY};
use crate::linalg;

/// Coefficient storage: constant plus up to a cubic term
pub type DriftCoefficients = heapless::Vec<f64, { MAX_DRIFT_DEGREE as usize + 1 }>;

/// A fitted temperature drift model
///
/// Produced by [`fit_drift_model`]; holds no reference to the points it was
/// fitted from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriftFit {
    /// Polynomial degree (1..=3)
    pub degree: u8,
    /// Temperature the polynomial is centered on
    pub center_temp: f64,
    /// Mean timestamp of the fitted points (epoch ms)
    pub center_time_ms: f64,
    /// `degree + 1` coefficients; index 0 is the fitted constant and is not
    /// part of the correction
    pub coefficients: DriftCoefficients,
    /// Linear trend per day, when fitted. Never removed by the correction.
    pub time_slope_per_day: Option<f64>,
    /// Coefficient of determination in [0, 1]
    pub r2: Option<f64>,
    /// Number of points the fit used
    pub sample_count: usize,
    /// Lowest fitted temperature
    pub temp_min: f64,
    /// Highest fitted temperature
    pub temp_max: f64,
    /// Lowest fitted raw value
    pub raw_min: f64,
    /// Highest fitted raw value
    pub raw_max: f64,
}

impl DriftFit {
    /// Drift attributed to `temperature`: the non-constant polynomial terms at
    /// `temperature − center_temp`.
    ///
    /// With a finite positive `clamp_abs` the result is limited to
    /// `±clamp_abs`, which bounds extrapolation outside the fitted range.
    pub fn correction(&self, temperature: f64, clamp_abs: Option<f64>) -> f64 {
        let x = temperature - self.center_temp;

        // Horner over c₁..c_d, then one more factor of x
        let mut acc = 0.0;
        for &c in self.coefficients.iter().skip(1).rev() {
            acc = acc * x + c;
        }
        let correction = acc * x;

        match effective_clamp(clamp_abs) {
            Some(limit) => correction.clamp(-limit, limit),
            None => correction,
        }
    }

    /// Full model prediction, constant and time trend included
    pub fn predict(&self, temperature: f64, timestamp_ms: f64) -> f64 {
        let constant = self.coefficients.first().copied().unwrap_or(0.0);
        let trend = match self.time_slope_per_day {
            Some(slope) => slope * (timestamp_ms - self.center_time_ms) / MS_PER_DAY,
            None => 0.0,
        };
        constant + self.correction(temperature, None) + trend
    }

    /// True if `temperature` lies inside the fitted temperature range
    pub fn covers(&self, temperature: f64) -> bool {
        temperature >= self.temp_min && temperature <= self.temp_max
    }

    /// Derived-sensor formula for this fit, see [`expression::build_correction_expression`]
    pub fn to_expression(
        &self,
        raw_var: &str,
        temperature_var: &str,
        clamp_abs: Option<f64>,
    ) -> Option<String> {
        expression::build_correction_expression(
            raw_var,
            temperature_var,
            self.center_temp,
            &self.coefficients,
            clamp_abs,
        )
    }
}

/// Fewest aligned points a fit of `degree` accepts
pub fn min_fit_samples(degree: u8) -> usize {
    MIN_FIT_SAMPLES.max(degree as usize + 2)
}

/// Fit a drift polynomial of `degree` (1..=3) to aligned points.
///
/// `center_temp` defaults to the mean aligned temperature. With
/// `include_time_slope` a linear per-day trend is fitted alongside and
/// reported separately. Returns `None` for an unsupported degree, too few
/// points, a singular system or non-finite results.
pub fn fit_drift_model(
    points: &[AlignedPoint],
    degree: u8,
    center_temp: Option<f64>,
    include_time_slope: bool,
) -> Option<DriftFit> {
    if degree == 0 || degree > MAX_DRIFT_DEGREE {
        log_debug!("Drift fit: unsupported degree {}", degree);
        return None;
    }

    let points: Vec<&AlignedPoint> = points.iter().filter(|p| p.is_finite()).collect();
    let n = points.len();
    if n < min_fit_samples(degree) {
        log_debug!(
            "Drift fit: need {} points, have {}",
            min_fit_samples(degree),
            n
        );
        return None;
    }

    let count = n as f64;
    let center_temp = match center_temp {
        Some(center) if center.is_finite() => center,
        Some(_) => return None,
        None => points.iter().map(|p| p.temperature).sum::<f64>() / count,
    };
    let center_time_ms = points.iter().map(|p| p.timestamp_ms).sum::<f64>() / count;

    let poly_terms = degree as usize + 1;
    let cols = poly_terms + usize::from(include_time_slope);

    let design_row = |p: &AlignedPoint, row: &mut Vec<f64>| {
        row.clear();
        let x = p.temperature - center_temp;
        let mut power = 1.0;
        for _ in 0..poly_terms {
            row.push(power);
            power *= x;
        }
        if include_time_slope {
            row.push((p.timestamp_ms - center_time_ms) / MS_PER_DAY);
        }
    };

    // Accumulate XᵀX and Xᵀy without materializing X
    let mut normal = vec![vec![0.0; cols]; cols];
    let mut rhs = vec![0.0; cols];
    let mut row = Vec::with_capacity(cols);
    for &p in &points {
        design_row(p, &mut row);
        for i in 0..cols {
            rhs[i] += row[i] * p.raw;
            for j in 0..cols {
                normal[i][j] += row[i] * row[j];
            }
        }
    }

    let solution = match linalg::solve(&normal, &rhs) {
        Some(solution) => solution,
        None => {
            log_debug!("Drift fit: singular normal equations (degree {})", degree);
            return None;
        }
    };

    let mut coefficients = DriftCoefficients::new();
    for &c in &solution[..poly_terms] {
        coefficients.push(c).ok()?;
    }
    let time_slope_per_day = if include_time_slope {
        Some(solution[poly_terms])
    } else {
        None
    };

    let mut fit = DriftFit {
        degree,
        center_temp,
        center_time_ms,
        coefficients,
        time_slope_per_day,
        r2: None,
        sample_count: n,
        temp_min: f64::INFINITY,
        temp_max: f64::NEG_INFINITY,
        raw_min: f64::INFINITY,
        raw_max: f64::NEG_INFINITY,
    };

    for p in &points {
        fit.temp_min = fit.temp_min.min(p.temperature);
        fit.temp_max = fit.temp_max.max(p.temperature);
        fit.raw_min = fit.raw_min.min(p.raw);
        fit.raw_max = fit.raw_max.max(p.raw);
    }

    fit.r2 = r_squared(&points, &fit);
    Some(fit)
}

fn r_squared(points: &[&AlignedPoint], fit: &DriftFit) -> Option<f64> {
    let mean = points.iter().map(|p| p.raw).sum::<f64>() / points.len() as f64;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for p in points {
        let residual = p.raw - fit.predict(p.temperature, p.timestamp_ms);
        let deviation = p.raw - mean;
        ss_res += residual * residual;
        ss_tot += deviation * deviation;
    }

    if !ss_res.is_finite() || !ss_tot.is_finite() || ss_tot <= 0.0 {
        return None;
    }

    let r2 = 1.0 - ss_res / ss_tot;
    if r2.is_finite() {
        Some(r2.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Corrected value for one reading: `raw − correction(temperature)`.
///
/// `None` when either input is non-finite.
pub fn apply_correction(raw: f64, temperature: f64, fit: &DriftFit) -> Option<f64> {
    apply_correction_clamped(raw, temperature, fit, None)
}

/// [`apply_correction`] with the correction limited to `±clamp_abs`
pub fn apply_correction_clamped(
    raw: f64,
    temperature: f64,
    fit: &DriftFit,
    clamp_abs: Option<f64>,
) -> Option<f64> {
    if !raw.is_finite() || !temperature.is_finite() {
        return None;
    }
    let corrected = raw - fit.correction(temperature, clamp_abs);
    corrected.is_finite().then_some(corrected)
}

/// Corrected values for a whole aligned series
pub fn correct_aligned(points: &[AlignedPoint], fit: &DriftFit, clamp_abs: Option<f64>) -> Vec<f64> {
    points
        .iter()
        .map(|p| p.raw - fit.correction(p.temperature, clamp_abs))
        .collect()
}
