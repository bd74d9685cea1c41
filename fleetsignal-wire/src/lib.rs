//! Binary series payload codec for FleetSignal
//!
//! The dashboard fetches chart data as one compact little-endian payload per
//! request. [`decode`] turns it into [`SeriesView`]s that read points lazily
//! from the borrowed buffer; [`PayloadEncoder`] writes the same format.
//!
//! ```rust
//! use fleetsignal_wire::{decode, read_point, PayloadEncoder};
//!
//! let mut encoder = PayloadEncoder::new();
//! encoder.add_series("battery_v", None, 0.0, &[(0, 12.1), (60, 12.3)]).unwrap();
//! let bytes = encoder.finish();
//!
//! let payload = decode(&bytes).unwrap();
//! let point = read_point(&payload.series()[0], 1).unwrap();
//! assert_eq!(point.timestamp_ms, 60_000.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod decoder;
pub mod encoder;
pub mod error;

// Public API
pub use decoder::{decode, read_point, DecodedPayload, SeriesHeader, SeriesView, MAGIC};
pub use encoder::PayloadEncoder;
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use fleetsignal_core::SeriesPoint;
