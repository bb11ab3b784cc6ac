// src/math.rs

//! Complex linear-algebra helpers shared by the JADE stages.

use crate::error::{JadeError, Result};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::{Eigh, UPLO};
use num_complex::Complex64;

/// Conjugate (Hermitian) transpose: A^H.
pub fn adjoint<S>(a: &ArrayBase<S, Ix2>) -> Array2<Complex64>
where
    S: Data<Elem = Complex64>,
{
    a.t().mapv(|z| z.conj())
}

/// Sample covariance `X · X^H / T` of a (rows × samples) matrix.
pub fn covariance<S>(x: &ArrayBase<S, Ix2>) -> Array2<Complex64>
where
    S: Data<Elem = Complex64>,
{
    let t = x.ncols() as f64;
    x.dot(&adjoint(x)) / t
}

/// Sample pseudo-covariance `X · X^T / T` (no conjugation).
///
/// Vanishes for second-order circular signals.
pub fn pseudo_covariance<S>(x: &ArrayBase<S, Ix2>) -> Array2<Complex64>
where
    S: Data<Elem = Complex64>,
{
    let t = x.ncols() as f64;
    x.dot(&x.t()) / t
}

/// Eigendecomposition of a Hermitian matrix using LAPACK.
///
/// Eigenvalues are returned in ascending order, eigenvectors as columns.
/// Only the lower triangle of `a` is read.
pub fn hermitian_eigh<S>(
    a: &ArrayBase<S, Ix2>,
    what: &str,
) -> Result<(Array1<f64>, Array2<Complex64>)>
where
    S: Data<Elem = Complex64>,
{
    a.eigh(UPLO::Lower).map_err(|e| JadeError::ComputationError {
        message: format!("eigendecomposition of {} failed: {}", what, e),
    })
}

/// Apply a scalar function to a Hermitian matrix through its eigenpairs:
/// `U · diag(f(λ)) · U^H`.
pub fn spectral_function<F>(
    eigenvalues: &Array1<f64>,
    eigenvectors: &Array2<Complex64>,
    f: F,
) -> Array2<Complex64>
where
    F: Fn(f64) -> f64,
{
    let weights = eigenvalues.mapv(|l| Complex64::new(f(l), 0.0));
    let scaled = eigenvectors * &weights;
    scaled.dot(&adjoint(eigenvectors))
}

/// Largest absolute entry of `V^H · V - I`.
pub fn unitarity_deviation<S>(v: &ArrayBase<S, Ix2>) -> f64
where
    S: Data<Elem = Complex64>,
{
    let gram = adjoint(v).dot(v);
    gram.indexed_iter()
        .map(|((i, j), z)| {
            let target = if i == j { 1.0 } else { 0.0 };
            (*z - target).norm()
        })
        .fold(0.0, f64::max)
}

/// Fail with [`JadeError::NonFinite`] if any entry is NaN or infinite.
pub fn ensure_finite<S>(a: &ArrayBase<S, Ix2>, stage: &str) -> Result<()>
where
    S: Data<Elem = Complex64>,
{
    if a.iter().all(|z| z.is_finite()) {
        Ok(())
    } else {
        Err(JadeError::NonFinite {
            stage: stage.into(),
        })
    }
}
