// src/cumulants.rs

//! Fourth-order cumulant estimation for complex, possibly non-circular, signals.
//!
//! The cumulant tensor of whitened signals Y is stored as an (m²)×(m²) matrix:
//! entry (i, j, k, l) sits at row `i * m + j`, column `k * m + l`, and holds
//!
//! ```text
//! cum(Y_i, Y_j*, Y_k*, Y_l) = E[Y_i Y_j* Y_k* Y_l]
//!                             - R[i,j] R[l,k] - R[i,k] R[l,j] - C[i,l] C[j,k]*
//! ```
//!
//! where `R = E[Y Y^H]` and `C = E[Y Y^T]`. The matrix is Hermitian.

use crate::error::{JadeError, Result};
use crate::math::{adjoint, covariance, ensure_finite, pseudo_covariance};
use log::debug;
use ndarray::{Array2, Zip};
use num_complex::Complex64;
use rayon::prelude::*;

/// Strategy for estimating the cumulant matrix.
///
/// Both produce the same tensor up to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CumulantMethod {
    /// Evaluate every cell independently, in parallel. Memory O(m⁴).
    #[default]
    Direct,
    /// Form all products `Y_i Y_j*` first and get the moments from a single
    /// matrix product. Faster, needs an extra (m²)×T buffer.
    Batched,
}

/// Second-order statistics of `y`: covariance `R = Y·Y^H/T` and
/// pseudo-covariance `C = Y·Y^T/T`.
pub fn second_order_statistics(y: &Array2<Complex64>) -> (Array2<Complex64>, Array2<Complex64>) {
    (covariance(y), pseudo_covariance(y))
}

/// Estimate the fourth-order cumulant matrix of `y` (m × T).
///
/// # Returns
/// * (m²)×(m²) Hermitian matrix, see the module docs for the index layout
pub fn cumulant_matrix(y: &Array2<Complex64>, method: CumulantMethod) -> Result<Array2<Complex64>> {
    let (m, t) = y.dim();
    if m == 0 || t == 0 {
        return Err(JadeError::dimensions(format!(
            "cannot estimate cumulants of a {}x{} signal matrix",
            m, t
        )));
    }

    debug!("cumulants: {} signals, {} samples, {:?} estimator", m, t, method);

    let (r, c) = second_order_statistics(y);
    let q = match method {
        CumulantMethod::Direct => direct(y, &r, &c)?,
        CumulantMethod::Batched => batched(y, &r, &c),
    };

    ensure_finite(&q, "cumulant matrix")?;
    Ok(q)
}

/// Second-order contribution removed from the fourth moment.
#[inline]
fn gaussian_part(
    r: &Array2<Complex64>,
    c: &Array2<Complex64>,
    (i, j, k, l): (usize, usize, usize, usize),
) -> Complex64 {
    r[[i, j]] * r[[l, k]] + r[[i, k]] * r[[l, j]] + c[[i, l]] * c[[j, k]].conj()
}

fn direct(
    y: &Array2<Complex64>,
    r: &Array2<Complex64>,
    c: &Array2<Complex64>,
) -> Result<Array2<Complex64>> {
    let (m, t) = y.dim();
    let dim = m * m;
    let t_f = t as f64;

    let cells: Vec<Complex64> = (0..dim * dim)
        .into_par_iter()
        .map(|cell| {
            let (row, col) = (cell / dim, cell % dim);
            let idx = (row / m, row % m, col / m, col % m);
            let (yi, yj, yk, yl) = (y.row(idx.0), y.row(idx.1), y.row(idx.2), y.row(idx.3));

            let mut moment = Complex64::new(0.0, 0.0);
            for s in 0..t {
                moment += yi[s] * yj[s].conj() * yk[s].conj() * yl[s];
            }

            moment / t_f - gaussian_part(r, c, idx)
        })
        .collect();

    Array2::from_shape_vec((dim, dim), cells).map_err(|e| JadeError::ComputationError {
        message: format!("cumulant matrix assembly failed: {}", e),
    })
}

fn batched(
    y: &Array2<Complex64>,
    r: &Array2<Complex64>,
    c: &Array2<Complex64>,
) -> Array2<Complex64> {
    let (m, t) = y.dim();
    let dim = m * m;

    // z[(i, j), t] = Y_i(t) Y_j(t)*
    let mut z = Array2::zeros((dim, t));
    for i in 0..m {
        for j in 0..m {
            Zip::from(z.row_mut(i * m + j))
                .and(y.row(i))
                .and(y.row(j))
                .for_each(|zij, &yi, &yj| *zij = yi * yj.conj());
        }
    }

    let mut q = z.dot(&adjoint(&z)) / t as f64;
    for ((row, col), q_rc) in q.indexed_iter_mut() {
        *q_rc -= gaussian_part(r, c, (row / m, row % m, col / m, col % m));
    }

    q
}
