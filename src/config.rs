// src/config.rs

//! Configuration for the JADE algorithm.

use crate::cumulants::CumulantMethod;
use crate::error::{JadeError, Result};

/// Configuration parameters for the JADE algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct JadeConfig {
    /// Number of sources to extract. If None, uses the number of sensors.
    pub n_components: Option<usize>,

    /// Number of eigen-matrices to jointly diagonalize. If None, uses the
    /// number of sources. Using m² makes JADE equivalent to its contrast
    /// function even when the independence model does not hold.
    pub n_eigen_matrices: Option<usize>,

    /// Rotation magnitude below which a pair counts as diagonalized.
    /// If None, uses 1 / (100 · √T).
    pub threshold: Option<f64>,

    /// Maximum number of sweeps over all pairs.
    pub max_sweeps: usize,

    /// How the fourth-order cumulants are estimated.
    pub cumulant_method: CumulantMethod,

    /// Largest tolerated entry of `V^H V - I` after a sweep.
    pub unitarity_tol: f64,
}

impl Default for JadeConfig {
    fn default() -> Self {
        Self {
            n_components: None,
            n_eigen_matrices: None,
            threshold: None,
            max_sweeps: 200,
            cumulant_method: CumulantMethod::default(),
            unitarity_tol: 1e-8,
        }
    }
}

impl JadeConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Get the effective stopping threshold for `n_samples` samples.
    pub fn effective_threshold(&self, n_samples: usize) -> f64 {
        self.threshold
            .unwrap_or_else(|| 1.0 / (100.0 * (n_samples as f64).sqrt()))
    }

    /// Get the effective number of eigen-matrices for `n_components` sources.
    pub fn effective_eigen_matrices(&self, n_components: usize) -> usize {
        self.n_eigen_matrices.unwrap_or(n_components)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_components == Some(0) {
            return Err(JadeError::config("n_components", "must be at least 1"));
        }

        if self.n_eigen_matrices == Some(0) {
            return Err(JadeError::config("n_eigen_matrices", "must be at least 1"));
        }

        if let Some(threshold) = self.threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(JadeError::config("threshold", "must be finite and positive"));
            }
        }

        if self.max_sweeps == 0 {
            return Err(JadeError::config("max_sweeps", "must be greater than 0"));
        }

        if !(self.unitarity_tol.is_finite() && self.unitarity_tol > 0.0) {
            return Err(JadeError::config("unitarity_tol", "must be finite and positive"));
        }

        Ok(())
    }
}

/// Builder for constructing `JadeConfig` with a fluent API.
#[derive(Default)]
pub struct ConfigBuilder {
    config: JadeConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: JadeConfig::default(),
        }
    }

    /// Set the number of sources to extract.
    pub fn n_components(mut self, n: usize) -> Self {
        self.config.n_components = Some(n);
        self
    }

    /// Set the number of eigen-matrices to jointly diagonalize.
    pub fn n_eigen_matrices(mut self, n: usize) -> Self {
        self.config.n_eigen_matrices = Some(n);
        self
    }

    /// Set the rotation threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = Some(threshold);
        self
    }

    /// Set the maximum number of sweeps.
    pub fn max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.config.max_sweeps = max_sweeps;
        self
    }

    /// Set the cumulant estimator.
    pub fn cumulant_method(mut self, method: CumulantMethod) -> Self {
        self.config.cumulant_method = method;
        self
    }

    /// Set the unitarity tolerance.
    pub fn unitarity_tol(mut self, tol: f64) -> Self {
        self.config.unitarity_tol = tol;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> JadeConfig {
        self.config
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<JadeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
