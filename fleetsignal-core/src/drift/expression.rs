//! Correction formulas for derived sensors
//!
//! A fitted drift is persisted as a plain arithmetic expression over the raw
//! and temperature variable names so the dashboard's expression engine can
//! evaluate it without this crate:
//!
//! ```text
//! raw - (0.8*(temp - 21.5) - 0.02*(temp - 21.5)*(temp - 21.5))
//! raw - min(max(0.8*(temp - 21.5), -3), 3)
//! ```
//!
//! Powers are spelled as repeated products and only `+ - * min max` appear,
//! the subset every consumer of the formula supports.

use alloc::format;
use alloc::string::String;

use super::effective_clamp;

/// `(temp - center)`, with the sign folded for negative centers
fn centered_variable(temperature_var: &str, center_temp: f64) -> String {
    if center_temp < 0.0 {
        format!("({} + {})", temperature_var, libm::fabs(center_temp))
    } else {
        // + 0.0 folds -0.0 so it never prints as "-0"
        format!("({} - {})", temperature_var, center_temp + 0.0)
    }
}

fn polynomial(temperature_var: &str, center_temp: f64, coefficients: &[f64]) -> String {
    let x = centered_variable(temperature_var, center_temp);
    let mut out = String::new();

    for (power, &c) in coefficients.iter().enumerate().skip(1) {
        if c == 0.0 {
            continue;
        }

        if out.is_empty() {
            if c < 0.0 {
                out.push('-');
            }
        } else if c < 0.0 {
            out.push_str(" - ");
        } else {
            out.push_str(" + ");
        }

        out.push_str(&format!("{}", libm::fabs(c)));
        for _ in 0..power {
            out.push('*');
            out.push_str(&x);
        }
    }

    if out.is_empty() {
        out.push('0');
    }
    out
}

/// Build `raw - correction(temp)` as a formula string.
///
/// `coefficients` follow [`super::DriftFit::coefficients`]: index 0 is the
/// fitted constant and is left out. A finite positive `clamp_abs` wraps the
/// correction in `min(max(…, -c), c)`.
///
/// Returns `None` with fewer than two coefficients, a non-finite center or
/// coefficient, or an empty variable name.
pub fn build_correction_expression(
    raw_var: &str,
    temperature_var: &str,
    center_temp: f64,
    coefficients: &[f64],
    clamp_abs: Option<f64>,
) -> Option<String> {
    if raw_var.is_empty() || temperature_var.is_empty() {
        return None;
    }
    if coefficients.len() < 2 || !center_temp.is_finite() {
        return None;
    }
    if coefficients.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let poly = polynomial(temperature_var, center_temp, coefficients);

    Some(match effective_clamp(clamp_abs) {
        Some(limit) => format!("{} - min(max({}, -{}), {})", raw_var, poly, limit, limit),
        None => format!("{} - ({})", raw_var, poly),
    })
}
