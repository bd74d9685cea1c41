//! Exact-timestamp alignment of raw and temperature series

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::AlignedPoint;
use crate::constants::MS_PER_SECOND;
use crate::series::Sample;

/// Exact-timestamp lookup over a temperature series.
///
/// Built once and reused across every lag a search evaluates. Non-finite
/// samples are skipped; for duplicate timestamps the last sample wins.
#[derive(Debug, Clone, Default)]
pub struct TemperatureIndex {
    by_timestamp: BTreeMap<u64, f64>,
}

/// Map a timestamp to an ordered key.
///
/// Adding zero folds `-0.0` into `+0.0` so both hit the same entry.
fn timestamp_key(timestamp_ms: f64) -> u64 {
    (timestamp_ms + 0.0).to_bits()
}

impl TemperatureIndex {
    /// Index a temperature series
    pub fn new(temperature: &[Sample]) -> Self {
        let mut by_timestamp = BTreeMap::new();
        for sample in temperature.iter().filter(|sample| sample.is_finite()) {
            by_timestamp.insert(timestamp_key(sample.timestamp_ms), sample.value);
        }
        Self { by_timestamp }
    }

    /// Number of indexed timestamps
    pub fn len(&self) -> usize {
        self.by_timestamp.len()
    }

    /// True when no temperature sample was usable
    pub fn is_empty(&self) -> bool {
        self.by_timestamp.is_empty()
    }

    /// Temperature recorded at exactly `timestamp_ms`
    pub fn get(&self, timestamp_ms: f64) -> Option<f64> {
        self.by_timestamp.get(&timestamp_key(timestamp_ms)).copied()
    }

    /// Join `raw` against this index with the temperature shifted by `lag_seconds`.
    ///
    /// A raw sample at `t` pairs with the temperature at `t − lag`. Positive
    /// lags therefore use earlier temperature readings, the usual case when
    /// the raw signal trails the thermal effect. Unmatched samples are dropped.
    pub fn align(&self, raw: &[Sample], lag_seconds: f64) -> Vec<AlignedPoint> {
        if !lag_seconds.is_finite() {
            return Vec::new();
        }
        let shift_ms = lag_seconds * MS_PER_SECOND;

        raw.iter()
            .filter(|sample| sample.is_finite())
            .filter_map(|sample| {
                self.get(sample.timestamp_ms - shift_ms).map(|temperature| {
                    AlignedPoint::new(sample.timestamp_ms, temperature, sample.value)
                })
            })
            .collect()
    }
}

/// Pair every raw sample with the temperature at `(raw timestamp − lag)`.
///
/// See [`TemperatureIndex::align`]; this builds the index for a single use.
pub fn align_series_by_timestamp(
    raw: &[Sample],
    temperature: &[Sample],
    lag_seconds: f64,
) -> Vec<AlignedPoint> {
    TemperatureIndex::new(temperature).align(raw, lag_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn series(points: &[(f64, f64)]) -> Vec<Sample> {
        points.iter().map(|&p| Sample::from(p)).collect()
    }

    #[test]
    fn zero_lag_joins_exact_timestamps() {
        let raw = series(&[(0.0, 10.0), (60_000.0, 11.0), (90_000.0, 12.0)]);
        let temp = series(&[(0.0, 20.0), (60_000.0, 21.0), (120_000.0, 22.0)]);

        let aligned = align_series_by_timestamp(&raw, &temp, 0.0);
        assert_eq!(
            aligned,
            vec![
                AlignedPoint::new(0.0, 20.0, 10.0),
                AlignedPoint::new(60_000.0, 21.0, 11.0),
            ]
        );
    }

    #[test]
    fn positive_lag_uses_earlier_temperature() {
        let raw = series(&[(60_000.0, 1.0), (120_000.0, 2.0)]);
        let temp = series(&[(0.0, 20.0), (60_000.0, 25.0)]);

        let aligned = align_series_by_timestamp(&raw, &temp, 60.0);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].temperature, 20.0);
        assert_eq!(aligned[0].timestamp_ms, 60_000.0);
        assert_eq!(aligned[1].temperature, 25.0);
    }

    #[test]
    fn non_finite_samples_dropped() {
        let raw = series(&[(0.0, f64::NAN), (1_000.0, 2.0), (2_000.0, 3.0)]);
        let temp = series(&[(0.0, 1.0), (1_000.0, f64::INFINITY), (2_000.0, 4.0)]);

        let aligned = align_series_by_timestamp(&raw, &temp, 0.0);
        assert_eq!(aligned, vec![AlignedPoint::new(2_000.0, 4.0, 3.0)]);
        assert!(align_series_by_timestamp(&raw, &temp, f64::NAN).is_empty());
    }

    #[test]
    fn duplicate_temperature_timestamp_last_wins() {
        let temp = series(&[(0.0, 1.0), (0.0, 2.0)]);
        let index = TemperatureIndex::new(&temp);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0.0), Some(2.0));
        assert_eq!(index.get(-0.0), Some(2.0));
    }
}
