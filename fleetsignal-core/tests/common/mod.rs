//! Shared fixtures for integration tests
//!
//! Deterministic generators for temperature-driven sensor series. Timestamps
//! are whole milliseconds on a fixed bucket grid so lagged lookups land
//! exactly on indexed temperature samples.

#![allow(dead_code)]

use fleetsignal_core::Sample;

/// Xorshift generator, reproducible across platforms
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u32() >> 8) as f64 / 16_777_216.0
    }

    pub fn gen_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

/// Bucket grid and thermal cycle for a generated scenario
#[derive(Debug, Clone, Copy)]
pub struct ThermalScenario {
    /// Bucket interval (seconds)
    pub interval_seconds: f64,
    /// Raw samples to produce
    pub raw_samples: usize,
    /// Temperature history before the first raw sample (seconds)
    pub history_seconds: f64,
    /// Mean temperature (°C)
    pub base_temp: f64,
    /// Half peak-to-peak swing (°C)
    pub swing: f64,
    /// Thermal cycle period (seconds)
    pub period_seconds: f64,
}

impl Default for ThermalScenario {
    fn default() -> Self {
        Self {
            interval_seconds: 300.0,
            raw_samples: 864,
            history_seconds: 21_600.0,
            base_temp: 20.0,
            swing: 5.0,
            period_seconds: 21_600.0,
        }
    }
}

impl ThermalScenario {
    /// Temperature at `t_seconds`
    pub fn temperature_at(&self, t_seconds: f64) -> f64 {
        let phase = 2.0 * core::f64::consts::PI * t_seconds / self.period_seconds;
        self.base_temp + self.swing * phase.sin()
    }

    /// Temperature samples covering the history window and every raw bucket
    pub fn temperature_series(&self) -> Vec<Sample> {
        let history_buckets = (self.history_seconds / self.interval_seconds) as i64;
        (-history_buckets..self.raw_samples as i64)
            .map(|k| {
                let t = k as f64 * self.interval_seconds;
                Sample::new(t * 1_000.0, self.temperature_at(t))
            })
            .collect()
    }

    /// Raw series driven by temperature `lag_seconds` in the past:
    /// `raw(t) = offset + gain·(T(t − lag) − base) + noise`
    pub fn raw_series(
        &self,
        offset: f64,
        gain: f64,
        lag_seconds: f64,
        noise: Option<(&mut TestRng, f64)>,
    ) -> Vec<Sample> {
        let mut noise = noise;
        (0..self.raw_samples)
            .map(|k| {
                let t = k as f64 * self.interval_seconds;
                let drift = gain * (self.temperature_at(t - lag_seconds) - self.base_temp);
                let jitter = match noise.as_mut() {
                    Some((rng, amplitude)) => rng.gen_range(-*amplitude, *amplitude),
                    None => 0.0,
                };
                Sample::new(t * 1_000.0, offset + drift + jitter)
            })
            .collect()
    }
}
