// src/whitening.rs

//! Data preprocessing: centering and whitening.

use crate::error::{JadeError, Result};
use crate::math::{covariance, ensure_finite, hermitian_eigh, spectral_function};
use log::debug;
use ndarray::{s, Array1, Array2, Axis};
use num_complex::Complex64;

/// Smallest covariance eigenvalue, relative to the largest, accepted as non-singular.
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Result of whitening transformation.
#[derive(Debug, Clone)]
pub struct Whitening {
    /// Whitened data matrix Y = W · X (n_components × n_samples).
    pub data: Array2<Complex64>,
    /// Whitening matrix W (n_components × n_features).
    pub matrix: Array2<Complex64>,
    /// Pseudo-inverse of the whitening matrix IW (n_features × n_components).
    pub inverse: Array2<Complex64>,
    /// Eigenvalues of the observation covariance, ascending.
    pub eigenvalues: Array1<f64>,
    /// Estimated white-noise power. Only set when n_components < n_features.
    pub noise_variance: Option<f64>,
}

/// Center the data by subtracting the mean of each row.
///
/// # Arguments
/// * `x` - Data matrix of shape (n_features, n_samples)
///
/// # Returns
/// * Tuple of (centered_data, mean_vector)
pub fn center(x: &Array2<Complex64>) -> (Array2<Complex64>, Array1<Complex64>) {
    let (nrows, ncols) = x.dim();

    let mut mean = Array1::zeros(nrows);
    if ncols > 0 {
        for i in 0..nrows {
            mean[i] = x.row(i).sum() / ncols as f64;
        }
    }

    let centered = x - &mean.view().insert_axis(Axis(1));

    (centered, mean)
}

/// Whiten the data from the eigendecomposition of its covariance.
///
/// With `n_components == n_features` the whitening matrix is the inverse
/// square root of the covariance and no noise is modelled. With fewer
/// components, the `n_features - n_components` smallest eigenvalues are
/// treated as spatially white noise: their mean is subtracted from the
/// retained eigenvalues before scaling.
///
/// # Arguments
/// * `x` - Zero-mean data matrix of shape (n_features, n_samples)
/// * `n_components` - Number of components to keep
///
/// # Returns
/// * `Whitening` containing whitened data, W and its pseudo-inverse
pub fn whiten(x: &Array2<Complex64>, n_components: usize) -> Result<Whitening> {
    let (n_features, n_samples) = x.dim();

    if n_components == 0 || n_components > n_features {
        return Err(JadeError::dimensions(format!(
            "n_components ({}) must be between 1 and n_features ({})",
            n_components, n_features
        )));
    }
    if n_samples == 0 {
        return Err(JadeError::dimensions("cannot whiten an empty data matrix"));
    }

    let cov = covariance(x);
    let (eigenvalues, eigenvectors) = hermitian_eigh(&cov, "observation covariance")?;

    debug!(
        "whitening: covariance eigenvalues in [{:.4e}, {:.4e}]",
        eigenvalues[0],
        eigenvalues[n_features - 1]
    );

    let (matrix, inverse, noise_variance) = if n_components < n_features {
        let n_noise = n_features - n_components;
        let noise = eigenvalues.slice(s![..n_noise]).mean().unwrap_or(0.0);
        let largest = eigenvalues[n_features - 1];

        let mut matrix = Array2::zeros((n_components, n_features));
        let mut inverse = Array2::zeros((n_features, n_components));

        // Retained eigenpairs stay in ascending order: the last row of W
        // belongs to the strongest component.
        for r in 0..n_components {
            let idx = n_noise + r;
            let power = eigenvalues[idx] - noise;
            if !(power > SINGULARITY_TOLERANCE * largest) {
                return Err(JadeError::SingularMatrix {
                    message: format!(
                        "signal eigenvalue {:.4e} does not clear the noise floor {:.4e}",
                        eigenvalues[idx], noise
                    ),
                });
            }

            let scale = power.sqrt();
            for j in 0..n_features {
                let u = eigenvectors[[j, idx]];
                matrix[[r, j]] = u.conj() / scale;
                inverse[[j, r]] = u * scale;
            }
        }

        (matrix, inverse, Some(noise))
    } else {
        let smallest = eigenvalues[0];
        let largest = eigenvalues[n_features - 1];
        if !(smallest > SINGULARITY_TOLERANCE * largest) {
            return Err(JadeError::SingularMatrix {
                message: format!(
                    "observation covariance is not positive definite \
                     (eigenvalues span [{:.4e}, {:.4e}])",
                    smallest, largest
                ),
            });
        }

        let inverse = spectral_function(&eigenvalues, &eigenvectors, f64::sqrt);
        let matrix = spectral_function(&eigenvalues, &eigenvectors, |l| 1.0 / l.sqrt());

        (matrix, inverse, None)
    };

    let data = matrix.dot(x);
    ensure_finite(&data, "whitened signals")?;

    Ok(Whitening {
        data,
        matrix,
        inverse,
        eigenvalues,
        noise_variance,
    })
}
