// src/solver.rs

//! Main JADE solver interface.

use crate::config::JadeConfig;
use crate::cumulants::cumulant_matrix;
use crate::eigenmatrices::select_eigen_matrices;
use crate::error::{JadeError, Result};
use crate::jade::JointDiagonalizer;
use crate::math::{adjoint, ensure_finite};
use crate::result::JadeResult;
use crate::whitening::whiten;

use log::{debug, warn};
use ndarray::Array2;
use num_complex::Complex64;

/// The JADE blind source separation solver for complex signals.
///
/// This struct provides static methods for separating mixtures.
pub struct Jade;

impl Jade {
    /// Separate sources with default configuration.
    ///
    /// # Arguments
    /// * `x` - Zero-mean observation matrix of shape (n_features, n_samples)
    ///
    /// # Returns
    /// * `JadeResult` containing mixing matrix, sources, etc.
    pub fn separate(x: &Array2<Complex64>) -> Result<JadeResult> {
        Self::separate_with_config(x, &JadeConfig::default())
    }

    /// Separate sources with custom configuration.
    ///
    /// # Arguments
    /// * `x` - Zero-mean observation matrix of shape (n_features, n_samples)
    /// * `config` - Algorithm configuration
    ///
    /// # Returns
    /// * `JadeResult` containing mixing matrix, sources, etc.
    pub fn separate_with_config(x: &Array2<Complex64>, config: &JadeConfig) -> Result<JadeResult> {
        config.validate()?;

        let (n, t) = x.dim();

        if n < 2 {
            return Err(JadeError::dimensions(format!(
                "need at least 2 sensors, got {}",
                n
            )));
        }
        if t == 0 {
            return Err(JadeError::dimensions("observation matrix has no samples"));
        }

        let n_components = config.n_components.unwrap_or(n);
        if n_components > n {
            return Err(JadeError::dimensions(format!(
                "n_components ({}) cannot exceed the number of sensors ({})",
                n_components, n
            )));
        }

        let n_eigen = config.effective_eigen_matrices(n_components);
        if n_eigen > n_components * n_components {
            return Err(JadeError::config(
                "n_eigen_matrices",
                format!(
                    "cannot exceed n_components² ({}), got {}",
                    n_components * n_components,
                    n_eigen
                ),
            ));
        }

        let threshold = config.effective_threshold(t);

        ensure_finite(x, "observations")?;

        // Whiten the data
        let whitened = whiten(x, n_components)?;

        // Cumulants and their dominant eigen-matrices
        let q = cumulant_matrix(&whitened.data, config.cumulant_method)?;
        let stacked = select_eigen_matrices(&q, n_components, n_eigen)?;

        debug!(
            "JADE: {} sources from {} sensors, {} eigen-matrices, threshold {:.4e}",
            n_components, n, n_eigen, threshold
        );

        // Joint diagonalization
        let diag = JointDiagonalizer::new(stacked, n_eigen, threshold)?
            .run(config.max_sweeps, config.unitarity_tol)?;

        if !diag.converged {
            warn!(
                "JADE did not converge after {} sweeps ({} rotations), threshold {:.4e}",
                diag.n_sweeps, diag.n_rotations, threshold
            );
        }

        // Mixing and sources
        let mixing = whitened.inverse.dot(&diag.rotation);
        let sources = adjoint(&diag.rotation).dot(&whitened.data);
        ensure_finite(&mixing, "mixing matrix")?;
        ensure_finite(&sources, "source estimates")?;

        Ok(JadeResult {
            mixing,
            sources,
            whitening: whitened.matrix,
            dewhitening: whitened.inverse,
            rotation: diag.rotation,
            eigen_matrices: diag.matrices,
            noise_variance: whitened.noise_variance,
            threshold,
            n_eigen_matrices: n_eigen,
            n_sweeps: diag.n_sweeps,
            n_rotations: diag.n_rotations,
            converged: diag.converged,
        })
    }

    /// Transform new data using a fitted model.
    ///
    /// # Arguments
    /// * `x` - New data matrix (n_features, n_samples)
    /// * `result` - Result from a previous separation
    ///
    /// # Returns
    /// * Source estimates (n_components, n_samples)
    pub fn transform(x: &Array2<Complex64>, result: &JadeResult) -> Result<Array2<Complex64>> {
        let n_features = result.whitening.ncols();
        if x.nrows() != n_features {
            return Err(JadeError::dimensions(format!(
                "expected {} rows to match the fitted model, got {}",
                n_features,
                x.nrows()
            )));
        }

        ensure_finite(x, "observations")?;
        Ok(result.unmixing().dot(x))
    }
}
