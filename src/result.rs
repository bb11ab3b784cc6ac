//! Result types for the JADE algorithm.

use crate::error::{JadeError, Result};
use crate::math::adjoint;
use ndarray::{Array2, Axis};
use num_complex::Complex64;

/// Result of running JADE.
#[derive(Debug, Clone)]
pub struct JadeResult {
    /// Estimated mixing matrix A = IW · V (n_features × n_components).
    pub mixing: Array2<Complex64>,

    /// Estimated sources S = V^H · Y (n_components × n_samples).
    pub sources: Array2<Complex64>,

    /// Whitening matrix W (n_components × n_features).
    pub whitening: Array2<Complex64>,

    /// Pseudo-inverse of the whitening matrix IW (n_features × n_components).
    pub dewhitening: Array2<Complex64>,

    /// Unitary rotation V found by joint diagonalization (n_components × n_components).
    pub rotation: Array2<Complex64>,

    /// Eigen-matrices after joint diagonalization, stacked side by side.
    pub eigen_matrices: Array2<Complex64>,

    /// White-noise power removed during whitening.
    /// None when as many sources as sensors were extracted.
    pub noise_variance: Option<f64>,

    /// Rotation threshold that was used.
    pub threshold: f64,

    /// Number of eigen-matrices that were diagonalized.
    pub n_eigen_matrices: usize,

    /// Number of sweeps performed.
    pub n_sweeps: usize,

    /// Number of Givens rotations applied.
    pub n_rotations: usize,

    /// Whether joint diagonalization converged within the sweep bound.
    pub converged: bool,
}

impl JadeResult {
    /// Number of extracted sources.
    pub fn n_components(&self) -> usize {
        self.sources.nrows()
    }

    /// Get the full unmixing matrix that transforms original data to sources.
    ///
    /// This is `V^H · W`, a left inverse of the mixing matrix.
    pub fn unmixing(&self) -> Array2<Complex64> {
        adjoint(&self.rotation).dot(&self.whitening)
    }

    /// Project the sources back to sensor space: `A · S`.
    pub fn reconstruct(&self) -> Array2<Complex64> {
        self.mixing.dot(&self.sources)
    }

    /// Contribution of source `k` in sensor space: `A[:, k] · S[k, :]`.
    pub fn component(&self, k: usize) -> Result<Array2<Complex64>> {
        if k >= self.n_components() {
            return Err(JadeError::dimensions(format!(
                "component index {} out of range for {} sources",
                k,
                self.n_components()
            )));
        }

        let column = self.mixing.column(k).insert_axis(Axis(1));
        let row = self.sources.row(k).insert_axis(Axis(0));
        Ok(column.dot(&row))
    }

    /// Turn a non-converged result into [`JadeError::NotConverged`].
    pub fn ensure_converged(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(JadeError::NotConverged {
                sweeps: self.n_sweeps,
                rotations: self.n_rotations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::JadeConfig;
    use crate::error::JadeError;
    use crate::solver::Jade;
    use crate::utils::mixed_sources;
    use crate::whitening::center;
    use num_complex::Complex64;

    #[test]
    fn test_components_sum_to_reconstruction() {
        let (_, _, x) = mixed_sources(3, 800, 17);
        let (x, _) = center(&x);
        let result = Jade::separate(&x).unwrap();

        let mut total = ndarray::Array2::<Complex64>::zeros(x.dim());
        for k in 0..3 {
            total = total + result.component(k).unwrap();
        }

        let reconstruction = result.reconstruct();
        for (a, b) in total.iter().zip(reconstruction.iter()) {
            assert!((a - b).norm() < 1e-9);
        }

        // With as many sources as sensors the reconstruction is exact
        for (a, b) in reconstruction.iter().zip(x.iter()) {
            assert!((a - b).norm() < 1e-8);
        }

        assert!(matches!(
            result.component(3),
            Err(JadeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_unmixing_inverts_mixing() {
        let (_, _, x) = mixed_sources(2, 600, 23);
        let result = Jade::separate(&x).unwrap();

        let product = result.unmixing().dot(&result.mixing);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[[i, j]] - expected).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn test_ensure_converged() {
        let (_, _, x) = mixed_sources(4, 1000, 31);

        let config = JadeConfig::builder().threshold(1e-15).max_sweeps(1).build();
        let result = Jade::separate_with_config(&x, &config).unwrap();
        assert!(!result.converged);
        assert!(matches!(
            result.ensure_converged(),
            Err(JadeError::NotConverged { sweeps: 1, .. })
        ));

        let result = Jade::separate(&x).unwrap();
        assert!(result.converged);
        assert!(result.ensure_converged().is_ok());
    }
}
