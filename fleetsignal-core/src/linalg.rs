//! Small dense linear algebra for least-squares fits
//!
//! ## Overview
//!
//! Both the Savitzky–Golay filter and the drift model reduce to the normal
//! equations of a small polynomial least-squares problem:
//!
//! ```text
//! A = XᵀX        (k+1)×(k+1), k = polynomial degree
//! A·β = Xᵀy
//! ```
//!
//! In practice `A` is at most 5×5, so a purpose-built Gauss–Jordan
//! elimination is cheaper and more predictable than a general linear algebra
//! dependency.
//!
//! ## Partial Pivoting
//!
//! Each elimination step swaps in the row with the largest magnitude entry in
//! the pivot column. Near-duplicate window offsets are the realistic source of
//! ill-conditioning here, and pivoting keeps round-off bounded when they occur.
//! A pivot below [`SINGULAR_PIVOT_EPSILON`] means the system is singular and
//! the caller gets `None`, never a NaN-filled result.

use alloc::vec;
use alloc::vec::Vec;

use crate::constants::SINGULAR_PIVOT_EPSILON;

/// Row-major dense matrix
pub type Matrix = Vec<Vec<f64>>;

/// Gauss–Jordan elimination on an augmented matrix `[A | B]`.
///
/// `aug` holds `n` rows; the first `n` columns are `A`. On success the left
/// block is reduced to the identity and the right block holds `A⁻¹·B`.
///
/// Returns false if a pivot falls below the singularity threshold.
fn gauss_jordan(aug: &mut [Vec<f64>], n: usize) -> bool {
    let width = match aug.first() {
        Some(row) => row.len(),
        None => return true,
    };

    for k in 0..n {
        // Find pivot
        let mut max_row = k;
        let mut max_val = libm::fabs(aug[k][k]);

        for (i, row) in aug.iter().enumerate().take(n).skip(k + 1) {
            let candidate = libm::fabs(row[k]);
            if candidate > max_val {
                max_val = candidate;
                max_row = i;
            }
        }

        // Check for singular matrix
        if max_val.is_nan() || max_val < SINGULAR_PIVOT_EPSILON {
            log_trace!("Gauss-Jordan: singular pivot {} at column {}", max_val, k);
            return false;
        }

        if max_row != k {
            aug.swap(k, max_row);
        }

        // Scale pivot row
        let pivot = aug[k][k];
        for value in aug[k].iter_mut() {
            *value /= pivot;
        }

        // Eliminate column
        for i in 0..n {
            if i != k {
                let factor = aug[i][k];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..width {
                    let delta = factor * aug[k][j];
                    aug[i][j] -= delta;
                }
            }
        }
    }

    true
}

fn is_square(a: &[Vec<f64>]) -> bool {
    let n = a.len();
    a.iter().all(|row| row.len() == n)
}

/// Invert a square matrix.
///
/// Returns `None` for non-square input, a singular system, or a non-finite
/// result.
pub fn invert(a: &[Vec<f64>]) -> Option<Matrix> {
    if !is_square(a) {
        return None;
    }
    let n = a.len();

    // Create augmented matrix [A | I]
    let mut aug: Matrix = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut extended = Vec::with_capacity(2 * n);
            extended.extend_from_slice(row);
            extended.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            extended
        })
        .collect();

    if !gauss_jordan(&mut aug, n) {
        return None;
    }

    // Extract inverse from right side
    let inverse: Matrix = aug.into_iter().map(|row| row[n..].to_vec()).collect();
    if inverse.iter().flatten().all(|v| v.is_finite()) {
        Some(inverse)
    } else {
        None
    }
}

/// Solve `A·x = b` for square `A`.
///
/// Returns `None` on dimension mismatch, a singular system, or a non-finite
/// solution.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    if !is_square(a) || a.len() != b.len() {
        return None;
    }
    let n = a.len();

    let mut aug: Matrix = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut extended = Vec::with_capacity(n + 1);
            extended.extend_from_slice(row);
            extended.push(rhs);
            extended
        })
        .collect();

    if !gauss_jordan(&mut aug, n) {
        return None;
    }

    let x: Vec<f64> = aug.iter().map(|row| row[n]).collect();
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Gram matrix `XᵀX` of a row-major design matrix.
pub fn gram(x: &[Vec<f64>]) -> Matrix {
    let cols = x.first().map_or(0, |row| row.len());
    let mut result = vec![vec![0.0; cols]; cols];

    for row in x {
        for i in 0..cols {
            for j in i..cols {
                result[i][j] += row[i] * row[j];
            }
        }
    }

    // Mirror the upper triangle
    for i in 0..cols {
        for j in 0..i {
            result[i][j] = result[j][i];
        }
    }

    result
}
