//! Series Payload Decoder
//!
//! ## Layout
//!
//! All integers and floats are little-endian.
//!
//! ```text
//! ┌────────┬──────────┬─────────────┬──────────────┬──────────────────────┐
//! │ "FSB1" │ u16 N    │ u32 total   │ N headers    │ N data blocks        │
//! │ 4 B    │ 2 B      │ 4 B         │ variable     │ point_count × 8 B    │
//! └────────┴──────────┴─────────────┴──────────────┴──────────────────────┘
//!
//! header  = u16 id_len, id, u16 name_len, name, u32 point_count, f64 base_ms
//! record  = u32 offset_seconds, f32 value
//! ```
//!
//! A zero-length display name means the series has none. Data blocks follow
//! the headers in header order and are never interleaved.
//!
//! ## Borrowing
//!
//! [`decode`] parses headers into owned strings but leaves point records in
//! the caller's buffer. Each [`SeriesView`] remembers where its block starts
//! and reads records on demand, so decoding cost is proportional to the
//! number of series, not the number of points. Every block is bounds-checked
//! during [`decode`]; point reads on a decoded payload cannot fail except by
//! index.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};
use fleetsignal_core::constants::MS_PER_SECOND;
use fleetsignal_core::{Sample, SeriesPoint};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult};

/// Payload magic, `b"FSB1"` read as a little-endian `u32`
pub const MAGIC: u32 = 0x3142_5346;

/// Magic, series count and total point count
pub const ENVELOPE_LEN: usize = 10;

/// Bytes per point record
pub const POINT_RECORD_LEN: usize = 8;

/// Per-series metadata parsed from a payload header
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesHeader {
    /// Series id, unique within the payload
    pub id: String,
    /// Human-readable name, if the producer sent one
    pub display_name: Option<String>,
    /// Number of point records in this series' data block
    pub point_count: u32,
    /// Epoch milliseconds that point offsets are relative to
    pub base_timestamp_ms: f64,
}

/// One decoded series: its header plus a window onto its point records
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView<'a> {
    header: SeriesHeader,
    buffer: &'a [u8],
    data_start: usize,
}

impl<'a> SeriesView<'a> {
    /// Parsed header
    pub fn header(&self) -> &SeriesHeader {
        &self.header
    }

    /// Series id
    pub fn id(&self) -> &str {
        &self.header.id
    }

    /// Display name, if present
    pub fn display_name(&self) -> Option<&str> {
        self.header.display_name.as_deref()
    }

    /// Declared point count
    pub fn point_count(&self) -> u32 {
        self.header.point_count
    }

    /// Number of points as a length
    pub fn len(&self) -> usize {
        self.header.point_count as usize
    }

    /// True for a series without points
    pub fn is_empty(&self) -> bool {
        self.header.point_count == 0
    }

    /// Byte offset of the first point record in the payload
    pub fn data_start(&self) -> usize {
        self.data_start
    }

    /// Point at `index`, see [`read_point`]
    pub fn read_point(&self, index: usize) -> Option<SeriesPoint> {
        read_point(self, index)
    }

    /// Iterate points in payload order
    pub fn points(&self) -> impl ExactSizeIterator<Item = SeriesPoint> + '_ {
        let records = self.records();
        let base = self.header.base_timestamp_ms;
        records
            .chunks_exact(POINT_RECORD_LEN)
            .map(move |record| decode_record(base, record))
    }

    /// Collect all points
    pub fn to_points(&self) -> Vec<SeriesPoint> {
        self.points().collect()
    }

    /// Collect all points widened for drift analysis
    pub fn to_samples(&self) -> Vec<Sample> {
        self.points().map(Sample::from).collect()
    }

    fn records(&self) -> &'a [u8] {
        let end = self.data_start + self.len() * POINT_RECORD_LEN;
        // Bounds were checked at decode time
        self.buffer.get(self.data_start..end).unwrap_or(&[])
    }
}

fn decode_record(base_timestamp_ms: f64, record: &[u8]) -> SeriesPoint {
    let offset_seconds = LittleEndian::read_u32(&record[0..4]);
    let value = LittleEndian::read_f32(&record[4..8]);
    SeriesPoint::new(
        base_timestamp_ms + f64::from(offset_seconds) * MS_PER_SECOND,
        value,
    )
}

/// Read the point at `index` from a decoded series.
///
/// Returns `None` when `index` is not below the series' point count.
pub fn read_point(series: &SeriesView<'_>, index: usize) -> Option<SeriesPoint> {
    if index >= series.len() {
        return None;
    }
    let start = series.data_start + index * POINT_RECORD_LEN;
    let record = series.buffer.get(start..start + POINT_RECORD_LEN)?;
    Some(decode_record(series.header.base_timestamp_ms, record))
}

/// All series from one payload, in header order
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload<'a> {
    series: Vec<SeriesView<'a>>,
    total_point_count: u32,
}

impl<'a> DecodedPayload<'a> {
    /// Series in header order
    pub fn series(&self) -> &[SeriesView<'a>] {
        &self.series
    }

    /// Number of series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True for a payload without series
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series with the given id
    pub fn get(&self, id: &str) -> Option<&SeriesView<'a>> {
        self.series.iter().find(|s| s.header.id == id)
    }

    /// Total point count declared in the envelope. Informational only;
    /// see [`SeriesView::point_count`] for the authoritative per-series counts.
    pub fn total_point_count(&self) -> u32 {
        self.total_point_count
    }

    /// Iterate series in header order
    pub fn iter(&self) -> core::slice::Iter<'_, SeriesView<'a>> {
        self.series.iter()
    }
}

impl<'p, 'a> IntoIterator for &'p DecodedPayload<'a> {
    type Item = &'p SeriesView<'a>;
    type IntoIter = core::slice::Iter<'p, SeriesView<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

/// Sequential little-endian reader over the payload
struct Reader<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    fn take(&mut self, needed: usize) -> DecodeResult<&'a [u8]> {
        let available = self.buffer.len() - self.pos;
        if needed > available {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed,
                available,
            });
        }
        let bytes = &self.buffer[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn read_u16(&mut self) -> DecodeResult<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    fn read_u32(&mut self) -> DecodeResult<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    fn read_f64(&mut self) -> DecodeResult<f64> {
        self.take(8).map(LittleEndian::read_f64)
    }

    fn read_string(&mut self) -> DecodeResult<String> {
        let len = self.read_u16()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        core::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn read_header(&mut self) -> DecodeResult<SeriesHeader> {
        let id = self.read_string()?;
        let name = self.read_string()?;
        let point_count = self.read_u32()?;
        let base_timestamp_ms = self.read_f64()?;

        Ok(SeriesHeader {
            id,
            display_name: if name.is_empty() { None } else { Some(name) },
            point_count,
            base_timestamp_ms,
        })
    }
}

/// Decode a series payload.
///
/// Parses the envelope and every header, then assigns each series its data
/// block. Fails on the first structural problem; no partial result is
/// returned.
pub fn decode(buffer: &[u8]) -> DecodeResult<DecodedPayload<'_>> {
    if buffer.len() < ENVELOPE_LEN {
        return Err(DecodeError::TooShort {
            len: buffer.len(),
            min: ENVELOPE_LEN,
        });
    }

    let mut reader = Reader::new(buffer);
    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let series_count = reader.read_u16()? as usize;
    let total_point_count = reader.read_u32()?;

    let mut headers = Vec::with_capacity(series_count);
    for _ in 0..series_count {
        headers.push(reader.read_header()?);
    }

    let mut seen = BTreeSet::new();
    for (index, header) in headers.iter().enumerate() {
        if !seen.insert(header.id.as_str()) {
            return Err(DecodeError::DuplicateSeriesId {
                id: header.id.clone(),
                index,
            });
        }
    }
    drop(seen);

    let mut series = Vec::with_capacity(series_count);
    let mut data_start = reader.pos;
    let mut actual_points: u64 = 0;
    for header in headers {
        let available = buffer.len() - data_start;
        let needed = (header.point_count as usize)
            .checked_mul(POINT_RECORD_LEN)
            .filter(|&needed| needed <= available)
            .ok_or(DecodeError::Truncated {
                offset: data_start,
                needed: (header.point_count as usize).saturating_mul(POINT_RECORD_LEN),
                available,
            })?;

        actual_points += u64::from(header.point_count);
        series.push(SeriesView {
            header,
            buffer,
            data_start,
        });
        data_start += needed;
    }

    if actual_points != u64::from(total_point_count) {
        log_warn!(
            "Payload declares {} points, series headers sum to {}",
            total_point_count,
            actual_points
        );
    }
    if data_start < buffer.len() {
        log_trace!("Ignoring {} trailing payload bytes", buffer.len() - data_start);
    }

    Ok(DecodedPayload {
        series,
        total_point_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn envelope(series_count: u16, total: u32) -> Vec<u8> {
        let mut buf = vec![0u8; ENVELOPE_LEN];
        LittleEndian::write_u32(&mut buf[0..4], MAGIC);
        LittleEndian::write_u16(&mut buf[4..6], series_count);
        LittleEndian::write_u32(&mut buf[6..10], total);
        buf
    }

    fn push_string(buf: &mut Vec<u8>, s: &[u8]) {
        let mut len = [0u8; 2];
        LittleEndian::write_u16(&mut len, s.len() as u16);
        buf.extend_from_slice(&len);
        buf.extend_from_slice(s);
    }

    fn push_header(buf: &mut Vec<u8>, id: &[u8], name: &[u8], count: u32, base: f64) {
        push_string(buf, id);
        push_string(buf, name);
        let mut tail = [0u8; 12];
        LittleEndian::write_u32(&mut tail[0..4], count);
        LittleEndian::write_f64(&mut tail[4..12], base);
        buf.extend_from_slice(&tail);
    }

    fn push_record(buf: &mut Vec<u8>, offset: u32, value: f32) {
        let mut record = [0u8; POINT_RECORD_LEN];
        LittleEndian::write_u32(&mut record[0..4], offset);
        LittleEndian::write_f32(&mut record[4..8], value);
        buf.extend_from_slice(&record);
    }

    #[test]
    fn magic_spells_fsb1() {
        assert_eq!(LittleEndian::read_u32(b"FSB1"), MAGIC);
    }

    #[test]
    fn decodes_single_series() {
        let mut buf = envelope(1, 2);
        push_header(&mut buf, b"temp", b"Temperature", 2, 1_000.0);
        push_record(&mut buf, 0, 21.5);
        push_record(&mut buf, 30, 22.0);

        let payload = decode(&buf).unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.total_point_count(), 2);

        let series = payload.get("temp").unwrap();
        assert_eq!(series.display_name(), Some("Temperature"));
        assert_eq!(series.data_start(), buf.len() - 16);
        assert_eq!(series.read_point(1), Some(SeriesPoint::new(31_000.0, 22.0)));
        assert_eq!(series.read_point(2), None);
    }

    #[test]
    fn empty_name_is_absent() {
        let mut buf = envelope(1, 0);
        push_header(&mut buf, b"a", b"", 0, 0.0);

        let payload = decode(&buf).unwrap();
        assert_eq!(payload.series()[0].display_name(), None);
        assert!(payload.series()[0].is_empty());
        assert!(payload.series()[0].to_points().is_empty());
    }

    #[test]
    fn too_short_and_bad_magic() {
        assert_eq!(
            decode(&[0u8; 9]),
            Err(DecodeError::TooShort { len: 9, min: 10 })
        );

        let mut buf = envelope(0, 0);
        buf[0] = b'X';
        assert!(matches!(
            decode(&buf),
            Err(DecodeError::BadMagic { expected: MAGIC, .. })
        ));
    }

    #[test]
    fn truncated_header() {
        let mut buf = envelope(1, 1);
        push_string(&mut buf, b"abc");
        assert_eq!(
            decode(&buf),
            Err(DecodeError::Truncated {
                offset: 15,
                needed: 2,
                available: 0
            })
        );
    }

    #[test]
    fn truncated_data_block() {
        let mut buf = envelope(1, 2);
        push_header(&mut buf, b"x", b"", 2, 0.0);
        let data_start = buf.len();
        push_record(&mut buf, 0, 1.0);

        assert_eq!(
            decode(&buf),
            Err(DecodeError::Truncated {
                offset: data_start,
                needed: 16,
                available: 8
            })
        );
    }

    #[test]
    fn invalid_utf8() {
        let mut buf = envelope(1, 0);
        push_header(&mut buf, &[0xFF, 0xFE], b"", 0, 0.0);
        assert_eq!(decode(&buf), Err(DecodeError::InvalidUtf8 { offset: 12 }));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut buf = envelope(2, 0);
        push_header(&mut buf, b"dup", b"", 0, 0.0);
        push_header(&mut buf, b"dup", b"", 0, 0.0);
        assert_eq!(
            decode(&buf),
            Err(DecodeError::DuplicateSeriesId {
                id: String::from("dup"),
                index: 1
            })
        );
    }

    #[test]
    fn declared_total_is_informational() {
        let mut buf = envelope(1, 99);
        push_header(&mut buf, b"x", b"", 1, 0.0);
        push_record(&mut buf, 5, 1.0);

        let payload = decode(&buf).unwrap();
        assert_eq!(payload.total_point_count(), 99);
        assert_eq!(payload.series()[0].len(), 1);
    }
}
