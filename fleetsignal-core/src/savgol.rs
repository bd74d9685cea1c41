//! Savitzky–Golay Smoothing and Differentiation over Gappy Series
//!
//! ## Overview
//!
//! A Savitzky–Golay filter fits a low-order polynomial to every window of
//! `W` samples by least squares and evaluates the fit (or one of its
//! derivatives) at a single point of the window. Compared with a moving
//! average it keeps peak height and width, and derivative outputs come out
//! correctly scaled to real time units.
//!
//! ## Coefficients
//!
//! For a window evaluated at integer position `p` the design matrix is
//!
//! ```text
//! X[i][j] = (i - p)^j        i ∈ [0, W), j ∈ [0, poly_order]
//! ```
//!
//! and the weight applied to sample `i` is
//!
//! ```text
//! c[i] = (XᵀX)⁻¹[deriv_order] · X[i] × deriv_order! / Δt^deriv_order
//! ```
//!
//! The centered kernel (`p = W/2`) serves every interior sample. Shifted
//! kernels are only needed by [`EdgeMode::Interp`] near run boundaries.
//! Both live in a [`CoefficientCache`] owned by one filter call and dropped
//! when it returns, so nothing is shared between calls.
//!
//! ## Gaps
//!
//! The filter never smooths across a missing value:
//!
//! ```text
//! input:  1.0  1.2  1.1  --  --  2.0  2.1  2.3  2.2  2.4
//!         └─── run A ───┘        └──────── run B ────────┘
//! ```
//!
//! Each maximal run of present values is filtered on its own. Runs shorter
//! than the window are copied through when smoothing and blanked when
//! differentiating, since a derivative from a partial window is meaningless.
//!
//! ## Failure Policy
//!
//! Invalid options make [`savgol_filter`] return its input unchanged. Callers
//! that need to surface the reason use [`validate_filter_options`] first.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::constants::{DEFAULT_POLY_ORDER, DEFAULT_WINDOW_LENGTH, MIN_WINDOW_LENGTH};
use crate::linalg;

/// Result type for filter option validation
pub type FilterResult<T> = Result<T, FilterOptionsError>;

/// Reasons filter options are rejected
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FilterOptionsError {
    /// Window shorter than the minimum
    #[error("Window length {window_length} is below the minimum of {min}")]
    WindowTooShort {
        /// Requested window length
        window_length: usize,
        /// Smallest accepted window
        min: usize,
    },

    /// Window has no center sample
    #[error("Window length {window_length} must be odd")]
    EvenWindow {
        /// Requested window length
        window_length: usize,
    },

    /// Polynomial cannot be fitted from the window's samples
    #[error("Polynomial order {poly_order} must be less than window length {window_length}")]
    PolyOrderTooHigh {
        /// Requested polynomial order
        poly_order: usize,
        /// Requested window length
        window_length: usize,
    },

    /// Derivative of the fitted polynomial is identically zero
    #[error("Derivative order {deriv_order} exceeds polynomial order {poly_order}")]
    DerivOrderTooHigh {
        /// Requested derivative order
        deriv_order: usize,
        /// Requested polynomial order
        poly_order: usize,
    },

    /// Sample spacing must be a positive real
    #[error("Sample spacing {sample_spacing} must be positive and finite")]
    InvalidSampleSpacing {
        /// Requested spacing
        sample_spacing: f64,
    },
}

/// Policy for windows that would extend past a run boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EdgeMode {
    /// Fit a window shifted to stay inside the run (textbook boundary handling)
    #[default]
    Interp,
    /// Clamp out-of-range indices to the nearest sample
    Nearest,
    /// Reflect out-of-range indices back into the run
    Mirror,
    /// Leave boundary positions missing
    Clip,
}

/// Savitzky–Golay filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterOptions {
    /// Samples per window (odd, ≥ 3)
    pub window_length: usize,
    /// Polynomial order fitted in each window
    pub poly_order: usize,
    /// Derivative order returned (0 = smoothing)
    pub deriv_order: usize,
    /// Real time between samples, scales derivatives
    pub sample_spacing: f64,
    /// Boundary handling
    pub edge_mode: EdgeMode,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_WINDOW_LENGTH,
            poly_order: DEFAULT_POLY_ORDER,
            deriv_order: 0,
            sample_spacing: 1.0,
            edge_mode: EdgeMode::Interp,
        }
    }
}

impl FilterOptions {
    /// Smoothing with the given window and polynomial order
    pub fn smoothing(window_length: usize, poly_order: usize) -> Self {
        Self {
            window_length,
            poly_order,
            ..Self::default()
        }
    }

    /// Differentiation scaled to `sample_spacing` time units
    pub fn derivative(
        window_length: usize,
        poly_order: usize,
        deriv_order: usize,
        sample_spacing: f64,
    ) -> Self {
        Self {
            window_length,
            poly_order,
            deriv_order,
            sample_spacing,
            ..Self::default()
        }
    }

    /// Set boundary handling
    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Set sample spacing
    pub fn with_sample_spacing(mut self, sample_spacing: f64) -> Self {
        self.sample_spacing = sample_spacing;
        self
    }

    /// Set derivative order
    pub fn with_deriv_order(mut self, deriv_order: usize) -> Self {
        self.deriv_order = deriv_order;
        self
    }

    /// Check these options, see [`validate_filter_options`]
    pub fn validate(&self) -> FilterResult<()> {
        validate_filter_options(self)
    }
}

/// Check filter options before running the numerical core.
pub fn validate_filter_options(options: &FilterOptions) -> FilterResult<()> {
    let window_length = options.window_length;

    if window_length < MIN_WINDOW_LENGTH {
        return Err(FilterOptionsError::WindowTooShort {
            window_length,
            min: MIN_WINDOW_LENGTH,
        });
    }
    if window_length % 2 == 0 {
        return Err(FilterOptionsError::EvenWindow { window_length });
    }
    if options.poly_order >= window_length {
        return Err(FilterOptionsError::PolyOrderTooHigh {
            poly_order: options.poly_order,
            window_length,
        });
    }
    if options.deriv_order > options.poly_order {
        return Err(FilterOptionsError::DerivOrderTooHigh {
            deriv_order: options.deriv_order,
            poly_order: options.poly_order,
        });
    }
    if !(options.sample_spacing.is_finite() && options.sample_spacing > 0.0) {
        return Err(FilterOptionsError::InvalidSampleSpacing {
            sample_spacing: options.sample_spacing,
        });
    }

    Ok(())
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Compute the Savitzky–Golay kernel for a window evaluated at `position`.
///
/// `position` is the index inside the window (`window_length / 2` gives the
/// centered kernel). Returns `None` when the normal equations are singular or
/// the arguments cannot describe a window.
pub fn savgol_coefficients(
    window_length: usize,
    poly_order: usize,
    deriv_order: usize,
    sample_spacing: f64,
    position: usize,
) -> Option<Vec<f64>> {
    if window_length == 0 || position >= window_length || deriv_order > poly_order {
        return None;
    }

    let design: linalg::Matrix = (0..window_length)
        .map(|i| {
            let offset = i as f64 - position as f64;
            let mut power = 1.0;
            (0..=poly_order)
                .map(|_| {
                    let term = power;
                    power *= offset;
                    term
                })
                .collect()
        })
        .collect();

    let inverse = linalg::invert(&linalg::gram(&design))?;
    let scale = factorial(deriv_order) / libm::pow(sample_spacing, deriv_order as f64);
    let selector = &inverse[deriv_order];

    let kernel: Vec<f64> = design
        .iter()
        .map(|row| {
            let dot: f64 = selector.iter().zip(row).map(|(a, x)| a * x).sum();
            dot * scale
        })
        .collect();

    if kernel.iter().all(|c| c.is_finite()) {
        Some(kernel)
    } else {
        None
    }
}

/// Resolved kernel for one window position
#[derive(Debug, Clone)]
enum Kernel {
    Singular,
    Ready(Vec<f64>),
}

/// Kernels for one filter call, keyed by evaluation position in the window.
///
/// Slots are created on first use only: the centered kernel is resolved once
/// and reused for every interior sample, shifted kernels appear only when a
/// run boundary asks for them. Runs shorter than the window never touch it.
#[derive(Debug)]
struct CoefficientCache {
    options: FilterOptions,
    kernels: BTreeMap<usize, Kernel>,
}

impl CoefficientCache {
    fn new(options: &FilterOptions) -> Self {
        Self {
            options: *options,
            kernels: BTreeMap::new(),
        }
    }

    fn kernel(&mut self, position: usize) -> Option<&[f64]> {
        if position >= self.options.window_length {
            return None;
        }

        let options = &self.options;
        let slot = self.kernels.entry(position).or_insert_with(|| {
            match savgol_coefficients(
                options.window_length,
                options.poly_order,
                options.deriv_order,
                options.sample_spacing,
                position,
            ) {
                Some(kernel) => Kernel::Ready(kernel),
                None => {
                    log_trace!("Savitzky-Golay: singular window at position {}", position);
                    Kernel::Singular
                }
            }
        });

        match slot {
            Kernel::Ready(kernel) => Some(kernel.as_slice()),
            Kernel::Singular => None,
        }
    }
}

fn is_present(value: &Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite())
}

/// Map a possibly out-of-range window index back into `[0, len)` by reflection.
fn mirror_index(mut index: isize, len: usize) -> usize {
    let last = len as isize - 1;
    if last <= 0 {
        return 0;
    }
    while index < 0 || index > last {
        if index < 0 {
            index = -index;
        } else {
            index = 2 * last - index;
        }
    }
    index as usize
}

fn nearest_index(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

/// Filter one gap-free run into `out`.
fn filter_run(run: &[f64], out: &mut [Option<f64>], cache: &mut CoefficientCache) {
    let options = cache.options;
    let n = run.len();
    let window = options.window_length;
    let half = window / 2;

    if n < window {
        let fill = options.deriv_order == 0;
        for (slot, &value) in out.iter_mut().zip(run) {
            *slot = if fill { Some(value) } else { None };
        }
        return;
    }

    for k in 0..n {
        let interior = k >= half && k + half < n;

        out[k] = if interior {
            match cache.kernel(half) {
                Some(kernel) => Some(dot(kernel, &run[k - half..=k + half])),
                None => Some(run[k]),
            }
        } else {
            match options.edge_mode {
                EdgeMode::Clip => None,
                EdgeMode::Interp => {
                    let start = if k < half { 0 } else { n - window };
                    match cache.kernel(k - start) {
                        Some(kernel) => Some(dot(kernel, &run[start..start + window])),
                        None => Some(run[k]),
                    }
                }
                EdgeMode::Nearest => match cache.kernel(half) {
                    Some(kernel) => Some(remapped_dot(kernel, run, k, half, nearest_index)),
                    None => Some(run[k]),
                },
                EdgeMode::Mirror => match cache.kernel(half) {
                    Some(kernel) => Some(remapped_dot(kernel, run, k, half, mirror_index)),
                    None => Some(run[k]),
                },
            }
        };
    }
}

fn dot(kernel: &[f64], window: &[f64]) -> f64 {
    kernel.iter().zip(window).map(|(c, x)| c * x).sum()
}

fn remapped_dot(
    kernel: &[f64],
    run: &[f64],
    center: usize,
    half: usize,
    remap: fn(isize, usize) -> usize,
) -> f64 {
    kernel
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let index = center as isize + i as isize - half as isize;
            c * run[remap(index, run.len())]
        })
        .sum()
}

/// Smooth or differentiate a gappy series.
///
/// Returns a sequence of the same length. Missing inputs (`None` or
/// non-finite) pass through unchanged; extra missing outputs appear only at
/// run boundaries under [`EdgeMode::Clip`] and for runs shorter than the
/// window when differentiating. Invalid options return the input unchanged.
pub fn savgol_filter(values: &[Option<f64>], options: &FilterOptions) -> Vec<Option<f64>> {
    if let Err(reason) = validate_filter_options(options) {
        log_debug!("Savitzky-Golay options rejected, returning input: {}", reason);
        return values.to_vec();
    }

    let mut out = values.to_vec();
    let mut cache = CoefficientCache::new(options);
    let mut run: Vec<f64> = Vec::new();

    let mut start = 0;
    while start < values.len() {
        if !is_present(&values[start]) {
            start += 1;
            continue;
        }

        let mut end = start;
        run.clear();
        while end < values.len() {
            match values[end] {
                Some(v) if v.is_finite() => run.push(v),
                _ => break,
            }
            end += 1;
        }

        filter_run(&run, &mut out[start..end], &mut cache);
        start = end;
    }

    out
}

/// [`savgol_filter`] for dense `f64` slices, with NaN as the missing marker.
pub fn savgol_filter_dense(values: &[f64], options: &FilterOptions) -> Vec<f64> {
    let wrapped: Vec<Option<f64>> = values.iter().map(|&v| Some(v)).collect();
    savgol_filter(&wrapped, options)
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}
