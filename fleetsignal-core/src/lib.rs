//! Signal processing core for FleetSignal
//!
//! Numerical building blocks behind the fleet dashboard's charts and
//! "derived sensor" features:
//!
//! - [`savgol`]: Savitzky–Golay smoothing and differentiation over gappy series
//! - [`drift`]: temperature drift compensation with automatic lag search
//! - [`linalg`]: the small pivoted Gauss–Jordan solver both of them share
//!
//! Every operation is pure and synchronous. Nothing is cached between calls,
//! so all functions are safe to call concurrently from independent call sites.
//!
//! Failure policy is soft: invalid filter options return the input unchanged
//! and insufficient data yields `None` from the fit, because these run against
//! live, partially-missing operator data.
//!
//! ```rust
//! use fleetsignal_core::savgol::{savgol_filter, FilterOptions};
//!
//! let values = [Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
//! let smoothed = savgol_filter(&values, &FilterOptions::smoothing(3, 1));
//!
//! assert_eq!(smoothed.len(), values.len());
//! assert!(smoothed[2].is_none());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod constants;
pub mod drift;
pub mod linalg;
pub mod savgol;
pub mod series;

// Public API
pub use drift::{
    align_series_by_timestamp, apply_correction, build_correction_expression,
    fit_drift_model, suggest_lag_seconds, AlignedPoint, DriftFit, LagSearchConfig,
    LagSuggestion,
};
pub use savgol::{savgol_filter, validate_filter_options, EdgeMode, FilterOptions, FilterOptionsError};
pub use series::{Sample, SeriesPoint};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
