//! Decode and Filter Example
//!
//! Builds a chart payload the way a gateway would, decodes it as the
//! dashboard does and smooths one series, including across a gap.
//!
//! ## What You'll Learn
//!
//! - Encoding series with `PayloadEncoder`
//! - Decoding a payload and reading points lazily
//! - Smoothing and differentiating a gappy series
//! - Handling decode errors
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_decode_and_filter
//! ```

use fleetsignal_core::savgol::{savgol_filter, EdgeMode, FilterOptions};
use fleetsignal_wire::{decode, DecodeError, PayloadEncoder};

const BASE_MS: f64 = 1_700_000_000_000.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("FleetSignal Decode and Filter Example");
    println!("=====================================\n");

    // A noisy battery discharge sampled every minute
    let battery: Vec<(u32, f32)> = (0..30u32)
        .map(|i| {
            let jitter = if i % 2 == 0 { 0.03 } else { -0.03 };
            (i * 60, 12.6 - 0.01 * i as f32 + jitter)
        })
        .collect();

    let mut encoder = PayloadEncoder::new();
    encoder
        .add_series("battery_v", Some("Battery Voltage"), BASE_MS, &battery)?
        .add_series("rssi", None, BASE_MS, &[(0, -71.0), (60, -69.5)])?;
    let bytes = encoder.finish();
    println!("Encoded {} series into {} bytes\n", encoder.len(), bytes.len());

    let payload = decode(&bytes)?;
    for series in &payload {
        println!(
            "  {:<10} {:<16} {} points",
            series.id(),
            series.display_name().unwrap_or("-"),
            series.point_count()
        );
    }
    println!();

    let series = payload.get("battery_v").ok_or("battery_v missing")?;
    let mut values: Vec<Option<f64>> = series.points().map(|p| Some(f64::from(p.value))).collect();
    // The gateway dropped two buckets
    values[12] = None;
    values[13] = None;

    let smoothing = FilterOptions::smoothing(7, 2).with_edge_mode(EdgeMode::Interp);
    let smoothed = savgol_filter(&values, &smoothing);

    // Volts per minute
    let slope = FilterOptions::derivative(7, 2, 1, 1.0);
    let rate = savgol_filter(&values, &slope);

    println!("  minute   raw      smoothed   V/min");
    for (i, ((raw, smooth), dv)) in values.iter().zip(&smoothed).zip(&rate).enumerate().take(16) {
        let show = |v: &Option<f64>| v.map_or("   --   ".to_string(), |x| format!("{:8.3}", x));
        println!("  {:>6} {} {}   {}", i, show(raw), show(smooth), show(dv));
    }
    println!();

    // Corrupted payloads fail loudly
    let mut corrupted = bytes.clone();
    corrupted[0] = b'X';
    match decode(&corrupted) {
        Err(err @ DecodeError::BadMagic { .. }) => println!("Rejected corrupted payload: {}", err),
        other => println!("Unexpected result: {:?}", other.map(|p| p.len())),
    }

    Ok(())
}
