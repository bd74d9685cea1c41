//! Integration tests for payload decoding

mod common;

use fleetsignal_core::drift::{align_series_by_timestamp, fit_drift_model};
use fleetsignal_wire::{decode, read_point, DecodeError, PayloadEncoder, SeriesPoint, MAGIC};
use proptest::prelude::*;

use common::{battery_payload, drift_payload, BASE_MS};

#[test]
fn test_battery_scenario() {
    let bytes = battery_payload();
    let payload = decode(&bytes).unwrap();

    assert_eq!(payload.len(), 1);
    assert_eq!(payload.total_point_count(), 3);

    let series = &payload.series()[0];
    assert_eq!(series.id(), "battery_v");
    assert_eq!(series.display_name(), Some("Battery Voltage"));
    assert_eq!(series.point_count(), 3);

    assert_eq!(read_point(series, 0), Some(SeriesPoint::new(BASE_MS, 12.1)));
    assert_eq!(read_point(series, 1), Some(SeriesPoint::new(BASE_MS + 60_000.0, 12.3)));
    assert_eq!(read_point(series, 2), Some(SeriesPoint::new(BASE_MS + 120_000.0, 12.0)));
    assert_eq!(read_point(series, 3), None);

    assert_eq!(series.points().len(), 3);
    assert_eq!(series.to_points()[2].value, 12.0);
}

#[test]
fn test_series_blocks_follow_header_order() {
    let bytes = drift_payload(48);
    let payload = decode(&bytes).unwrap();

    let raw = payload.get("probe_raw").unwrap();
    let temp = payload.get("probe_temp").unwrap();
    assert_eq!(temp.data_start(), raw.data_start() + 48 * 8);
    assert_eq!(temp.display_name(), None);
    assert!(payload.get("missing").is_none());

    let ids: Vec<&str> = payload.iter().map(|s| s.id()).collect();
    assert_eq!(ids, ["probe_raw", "probe_temp"]);
}

#[test]
fn test_decoded_series_feed_drift_fit() {
    let bytes = drift_payload(96);
    let payload = decode(&bytes).unwrap();

    let raw = payload.get("probe_raw").unwrap().to_samples();
    let temp = payload.get("probe_temp").unwrap().to_samples();

    let aligned = align_series_by_timestamp(&raw, &temp, 0.0);
    assert_eq!(aligned.len(), 96);

    let fit = fit_drift_model(&aligned, 1, Some(20.0), false).unwrap();
    assert!((fit.coefficients[1] - 2.0).abs() < 1e-6);
    assert!((fit.coefficients[0] - 40.0).abs() < 1e-6);
}

#[test]
fn test_failure_modes() {
    assert!(matches!(decode(&[]), Err(DecodeError::TooShort { len: 0, .. })));

    let mut bytes = battery_payload();
    bytes[3] = b'2';
    let err = decode(&bytes).unwrap_err();
    assert_eq!(
        err,
        DecodeError::BadMagic {
            expected: MAGIC,
            found: u32::from_le_bytes(*b"FSB2"),
        }
    );
    assert_eq!(err.to_string(), "Bad magic: expected 0x31425346, found 0x32425346");

    let bytes = battery_payload();
    let cut = &bytes[..bytes.len() - 1];
    assert!(matches!(decode(cut), Err(DecodeError::Truncated { .. })));
}

#[test]
fn test_trailing_bytes_ignored() {
    let mut bytes = battery_payload();
    bytes.extend_from_slice(&[0xAA; 5]);
    assert_eq!(decode(&bytes).unwrap().series()[0].len(), 3);
}

proptest! {
    #[test]
    fn prop_short_buffers_rejected(bytes in prop::collection::vec(any::<u8>(), 0..10)) {
        let is_too_short = matches!(decode(&bytes), Err(DecodeError::TooShort { .. }));
        prop_assert!(is_too_short);
    }

    #[test]
    fn prop_wrong_magic_rejected(mut bytes in prop::collection::vec(any::<u8>(), 10..64)) {
        prop_assume!(bytes[0..4] != *b"FSB1");
        let is_bad_magic = matches!(decode(&bytes), Err(DecodeError::BadMagic { .. }));
        prop_assert!(is_bad_magic);
        bytes[0..4].copy_from_slice(b"FSB1");
        // Garbage after a valid magic may decode or fail, but never panics
        let _ = decode(&bytes);
    }

    #[test]
    fn prop_encoded_series_decode_exactly(
        base in 0.0f64..4.0e12,
        series in prop::collection::vec(
            prop::collection::vec((any::<u32>(), -1.0e6f32..1.0e6), 0..40),
            1..5,
        ),
    ) {
        let base = base.floor();
        let mut encoder = PayloadEncoder::new();
        for (i, points) in series.iter().enumerate() {
            encoder.add_series(&format!("s{}", i), None, base, points).unwrap();
        }
        let bytes = encoder.finish();
        let payload = decode(&bytes).unwrap();

        prop_assert_eq!(payload.len(), series.len());
        for (view, points) in payload.iter().zip(&series) {
            prop_assert_eq!(view.len(), points.len());
            for (decoded, &(offset, value)) in view.points().zip(points) {
                prop_assert_eq!(decoded.timestamp_ms, base + offset as f64 * 1000.0);
                prop_assert_eq!(decoded.value, value);
            }
        }
    }
}
