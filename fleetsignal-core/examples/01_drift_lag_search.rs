//! Drift Lag Search Example
//!
//! A pressure probe reads high when its housing warms up, and the housing
//! trails the air temperature by half an hour. This example finds that lag,
//! fits the drift at it and prints the derived-sensor formula.
//!
//! ## What You'll Learn
//!
//! - Scanning candidate lags with `suggest_lag_seconds`
//! - Fitting a drift polynomial at the chosen lag
//! - Correcting readings and emitting a correction expression
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_drift_lag_search
//! ```

use fleetsignal_core::drift::{
    align_series_by_timestamp, apply_correction, fit_drift_model, suggest_lag_seconds,
    LagSearchConfig,
};
use fleetsignal_core::Sample;

const INTERVAL_SECONDS: f64 = 300.0;
const TRUE_LAG_SECONDS: f64 = 1_800.0;

fn air_temperature(t_seconds: f64) -> f64 {
    // 12 hour HVAC cycle around 21°C
    21.0 + 4.0 * (2.0 * std::f64::consts::PI * t_seconds / 43_200.0).sin()
}

fn main() {
    println!("FleetSignal Drift Lag Search Example");
    println!("====================================\n");

    // Two days of five minute buckets, plus six hours of temperature history
    let temperature: Vec<Sample> = (-72..576)
        .map(|k| {
            let t = k as f64 * INTERVAL_SECONDS;
            Sample::new(t * 1_000.0, air_temperature(t))
        })
        .collect();
    let raw: Vec<Sample> = (0..576)
        .map(|k| {
            let t = k as f64 * INTERVAL_SECONDS;
            let drift = 0.8 * (air_temperature(t - TRUE_LAG_SECONDS) - 21.0);
            Sample::new(t * 1_000.0, 1013.0 + drift)
        })
        .collect();

    println!("Series:");
    println!("  raw samples:         {}", raw.len());
    println!("  temperature samples: {}", temperature.len());
    println!();

    let config = LagSearchConfig::default();
    let suggestion = suggest_lag_seconds(&raw, &temperature, INTERVAL_SECONDS, &config);

    println!("Lag search (step {}s):", suggestion.step_seconds);
    if let Some(baseline) = suggestion.baseline {
        println!("  zero lag reduces spread by {:.1}%", baseline.reduction_pct);
    }
    if let Some(best) = suggestion.best {
        println!(
            "  best lag {}s reduces spread by {:.1}%",
            best.lag_seconds, best.reduction_pct
        );
    }
    println!("  chosen lag: {}s\n", suggestion.lag_seconds);

    let aligned = align_series_by_timestamp(&raw, &temperature, suggestion.lag_seconds);
    let fit = match fit_drift_model(&aligned, 1, None, false) {
        Some(fit) => fit,
        None => {
            println!("Not enough aligned data to fit a drift model");
            return;
        }
    };

    println!("Drift fit:");
    println!("  center temperature: {:.2}°C", fit.center_temp);
    println!("  slope:              {:.4} hPa/°C", fit.coefficients[1]);
    if let Some(r2) = fit.r2 {
        println!("  R²:                 {:.4}", r2);
    }
    println!();

    println!("Corrections:");
    for &(raw_value, temp) in &[(1014.6, 23.0), (1011.4, 19.0)] {
        if let Some(corrected) = apply_correction(raw_value, temp, &fit) {
            println!("  {:.1} hPa at {:.1}°C -> {:.2} hPa", raw_value, temp, corrected);
        }
    }
    println!();

    if let Some(expression) = fit.to_expression("pressure", "housing_temp", Some(5.0)) {
        println!("Derived sensor formula:\n  {}", expression);
    }
}
