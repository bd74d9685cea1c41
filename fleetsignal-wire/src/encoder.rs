//! Series Payload Encoder
//!
//! Produces payloads in the layout [`crate::decoder`] reads. Used by
//! fixtures, benchmarks and producers that batch sensor readings for the
//! dashboard.
//!
//! ```rust
//! use fleetsignal_wire::{decode, PayloadEncoder};
//!
//! let mut encoder = PayloadEncoder::new();
//! encoder
//!     .add_series("battery_v", Some("Battery"), 1_700_000_000_000.0, &[(0, 12.1), (60, 12.3)])
//!     .unwrap();
//! let bytes = encoder.finish();
//!
//! let payload = decode(&bytes).unwrap();
//! assert_eq!(payload.get("battery_v").unwrap().point_count(), 2);
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::decoder::{ENVELOPE_LEN, MAGIC, POINT_RECORD_LEN};
use crate::error::{EncodeError, EncodeResult};

#[derive(Debug, Clone)]
struct PendingSeries {
    id: String,
    display_name: Option<String>,
    base_timestamp_ms: f64,
    points: Vec<(u32, f32)>,
}

/// Incremental payload builder
#[derive(Debug, Clone, Default)]
pub struct PayloadEncoder {
    series: Vec<PendingSeries>,
    total_points: u32,
}

fn check_string_len(field: &'static str, s: &str) -> EncodeResult<()> {
    if s.len() > u16::MAX as usize {
        return Err(EncodeError::StringTooLong {
            field,
            len: s.len(),
            max: u16::MAX as usize,
        });
    }
    Ok(())
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    let mut bytes = [0u8; 2];
    LittleEndian::write_u16(&mut bytes, value);
    out.extend_from_slice(&bytes);
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    let mut bytes = [0u8; 4];
    LittleEndian::write_u32(&mut bytes, value);
    out.extend_from_slice(&bytes);
}

fn put_f32(out: &mut Vec<u8>, value: f32) {
    let mut bytes = [0u8; 4];
    LittleEndian::write_f32(&mut bytes, value);
    out.extend_from_slice(&bytes);
}

fn put_f64(out: &mut Vec<u8>, value: f64) {
    let mut bytes = [0u8; 8];
    LittleEndian::write_f64(&mut bytes, value);
    out.extend_from_slice(&bytes);
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    // Lengths are checked when the series is added
    put_u16(out, s.len() as u16);
    out.extend_from_slice(s.as_bytes());
}

impl PayloadEncoder {
    /// Empty encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of series added so far
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True before the first series is added
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Append a series.
    ///
    /// `points` are `(offset_seconds, value)` pairs relative to
    /// `base_timestamp_ms`. An empty `display_name` is encoded as absent.
    pub fn add_series(
        &mut self,
        id: &str,
        display_name: Option<&str>,
        base_timestamp_ms: f64,
        points: &[(u32, f32)],
    ) -> EncodeResult<&mut Self> {
        if id.is_empty() {
            return Err(EncodeError::EmptyId);
        }
        check_string_len("series id", id)?;
        if let Some(name) = display_name {
            check_string_len("display name", name)?;
        }
        if self.series.len() >= u16::MAX as usize {
            return Err(EncodeError::TooManySeries {
                max: u16::MAX as usize,
            });
        }
        if self.series.iter().any(|s| s.id == id) {
            return Err(EncodeError::DuplicateSeriesId { id: String::from(id) });
        }

        let count = u32::try_from(points.len()).map_err(|_| EncodeError::PointCountOverflow {
            field: "series point count",
            count: points.len() as u64,
        })?;
        let total = self
            .total_points
            .checked_add(count)
            .ok_or(EncodeError::PointCountOverflow {
                field: "total point count",
                count: u64::from(self.total_points) + u64::from(count),
            })?;

        self.total_points = total;
        self.series.push(PendingSeries {
            id: String::from(id),
            display_name: display_name.filter(|name| !name.is_empty()).map(String::from),
            base_timestamp_ms,
            points: points.to_vec(),
        });
        Ok(self)
    }

    /// Serialize everything added so far
    pub fn finish(&self) -> Vec<u8> {
        let header_bytes: usize = self
            .series
            .iter()
            .map(|s| 2 + s.id.len() + 2 + s.display_name.as_ref().map_or(0, String::len) + 12)
            .sum();
        let mut out = Vec::with_capacity(
            ENVELOPE_LEN + header_bytes + self.total_points as usize * POINT_RECORD_LEN,
        );

        out.extend_from_slice(&MAGIC.to_le_bytes());
        put_u16(&mut out, self.series.len() as u16);
        put_u32(&mut out, self.total_points);

        for series in &self.series {
            put_string(&mut out, &series.id);
            put_string(&mut out, series.display_name.as_deref().unwrap_or(""));
            put_u32(&mut out, series.points.len() as u32);
            put_f64(&mut out, series.base_timestamp_ms);
        }

        for series in &self.series {
            for &(offset_seconds, value) in &series.points {
                put_u32(&mut out, offset_seconds);
                put_f32(&mut out, value);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn empty_payload_is_bare_envelope() {
        let bytes = PayloadEncoder::new().finish();
        assert_eq!(bytes, vec![b'F', b'S', b'B', b'1', 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn header_layout() {
        let mut encoder = PayloadEncoder::new();
        encoder.add_series("ab", Some("C"), 2.0, &[(7, 1.5)]).unwrap();
        let bytes = encoder.finish();

        // envelope + (2+2) + (2+1) + 4 + 8 + one record
        assert_eq!(bytes.len(), 10 + 4 + 3 + 12 + 8);
        assert_eq!(LittleEndian::read_u16(&bytes[4..6]), 1);
        assert_eq!(LittleEndian::read_u32(&bytes[6..10]), 1);
        assert_eq!(&bytes[12..14], b"ab");
        assert_eq!(&bytes[16..17], b"C");
        assert_eq!(LittleEndian::read_u32(&bytes[17..21]), 1);
        assert_eq!(LittleEndian::read_f64(&bytes[21..29]), 2.0);
        assert_eq!(LittleEndian::read_u32(&bytes[29..33]), 7);
        assert_eq!(LittleEndian::read_f32(&bytes[33..37]), 1.5);
    }

    #[test]
    fn rejects_bad_series() {
        let mut encoder = PayloadEncoder::new();
        assert_eq!(
            encoder.add_series("", None, 0.0, &[]).err(),
            Some(EncodeError::EmptyId)
        );

        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            encoder.add_series(&long, None, 0.0, &[]),
            Err(EncodeError::StringTooLong { field: "series id", .. })
        ));
        assert!(matches!(
            encoder.add_series("ok", Some(&long), 0.0, &[]),
            Err(EncodeError::StringTooLong { field: "display name", .. })
        ));

        encoder.add_series("ok", None, 0.0, &[]).unwrap();
        assert_eq!(
            encoder.add_series("ok", None, 0.0, &[]).err(),
            Some(EncodeError::DuplicateSeriesId { id: String::from("ok") })
        );
        assert_eq!(encoder.len(), 1);
    }
}
