//! Shared payload fixtures for integration tests

#![allow(dead_code)]

use fleetsignal_wire::PayloadEncoder;

/// Dashboard request start used by fixtures (epoch ms)
pub const BASE_MS: f64 = 1_700_000_000_000.0;

/// Single battery voltage series sampled once a minute
pub fn battery_payload() -> Vec<u8> {
    let mut encoder = PayloadEncoder::new();
    encoder
        .add_series(
            "battery_v",
            Some("Battery Voltage"),
            BASE_MS,
            &[(0, 12.1), (60, 12.3), (120, 12.0)],
        )
        .unwrap();
    encoder.finish()
}

/// Raw sensor and temperature series on a shared five minute grid
pub fn drift_payload(buckets: u32) -> Vec<u8> {
    let temperature: Vec<(u32, f32)> = (0..buckets)
        .map(|k| (k * 300, 20.0 + (k % 12) as f32 * 0.5))
        .collect();
    let raw: Vec<(u32, f32)> = temperature
        .iter()
        .map(|&(offset, temp)| (offset, 40.0 + 2.0 * (temp - 20.0)))
        .collect();

    let mut encoder = PayloadEncoder::new();
    encoder
        .add_series("probe_raw", Some("Probe (raw)"), BASE_MS, &raw)
        .unwrap()
        .add_series("probe_temp", None, BASE_MS, &temperature)
        .unwrap();
    encoder.finish()
}
