// src/eigenmatrices.rs

//! Selection of the significant eigen-matrices of the cumulant tensor.

use crate::error::{JadeError, Result};
use crate::math::{ensure_finite, hermitian_eigh};
use log::debug;
use ndarray::Array2;
use num_complex::Complex64;
use std::cmp::Ordering;

/// Extract the `n_eigen` most significant eigen-matrices of a cumulant matrix.
///
/// Each eigenvector of `q` is reshaped row-major into an m × m matrix and
/// scaled by the magnitude of its eigenvalue. The matrices are placed side by
/// side, most significant first.
///
/// # Arguments
/// * `q` - Cumulant matrix of shape (m², m²)
/// * `m` - Number of sources
/// * `n_eigen` - Number of eigen-matrices to keep, between 1 and m²
///
/// # Returns
/// * Stacked eigen-matrices of shape (m, n_eigen · m)
pub fn select_eigen_matrices(
    q: &Array2<Complex64>,
    m: usize,
    n_eigen: usize,
) -> Result<Array2<Complex64>> {
    let dim = m * m;
    if m == 0 || q.dim() != (dim, dim) {
        return Err(JadeError::dimensions(format!(
            "cumulant matrix of shape {:?} does not match {} sources",
            q.shape(),
            m
        )));
    }
    if n_eigen == 0 || n_eigen > dim {
        return Err(JadeError::config(
            "n_eigen_matrices",
            format!("must be between 1 and {} for {} sources, got {}", dim, m, n_eigen),
        ));
    }

    let (eigenvalues, eigenvectors) = hermitian_eigh(q, "cumulant matrix")?;

    // Stable ascending sort on magnitude; selection runs from the top.
    let magnitudes = eigenvalues.mapv(f64::abs);
    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&a, &b| {
        magnitudes[a]
            .partial_cmp(&magnitudes[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut stacked = Array2::zeros((m, n_eigen * m));
    for (u, &idx) in order.iter().rev().take(n_eigen).enumerate() {
        let scale = magnitudes[idx];
        let vector = eigenvectors.column(idx);
        for r in 0..m {
            for c in 0..m {
                stacked[[r, u * m + c]] = vector[r * m + c] * scale;
            }
        }
    }

    debug!(
        "eigen-matrices: kept {} of {}, leading |eigenvalue| {:.4e}",
        n_eigen,
        dim,
        magnitudes[order[dim - 1]]
    );

    ensure_finite(&stacked, "eigen-matrices")?;
    Ok(stacked)
}
