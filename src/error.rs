// src/error.rs

//! Error types for the cjade crate.

/// Broad category of a [`JadeError`].
///
/// Callers that retry with a different source count or threshold usually
/// only need to know which stage family failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or inconsistent shapes.
    Dimension,
    /// Singular covariance, failed eigendecomposition, non-finite values, lost unitarity.
    Numerical,
    /// Joint diagonalization hit its sweep bound.
    NonConvergence,
    /// Invalid configuration parameter.
    Config,
    /// Failure reported by a spectral transform collaborator.
    Transform,
}

/// Errors that can occur during JADE separation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JadeError {
    /// Input dimensions are invalid.
    #[error("Invalid dimensions: {message}")]
    InvalidDimensions {
        /// Description of the dimension error.
        message: String,
    },

    /// A singular matrix was encountered during computation.
    #[error("Singular matrix encountered: {message}")]
    SingularMatrix {
        /// Which matrix and why.
        message: String,
    },

    /// General computation error, typically a failed eigendecomposition.
    #[error("Computation error: {message}")]
    ComputationError {
        /// Description of what went wrong.
        message: String,
    },

    /// NaN or infinity produced (or received) at a stage boundary.
    #[error("Non-finite values in {stage}")]
    NonFinite {
        /// Stage at which the values were detected.
        stage: String,
    },

    /// The accumulated rotation drifted away from a unitary matrix.
    #[error("Rotation lost unitarity: |V^H V - I| = {deviation:.4e} exceeds {tolerance:.4e}")]
    LostUnitarity {
        /// Largest absolute entry of `V^H V - I`.
        deviation: f64,
        /// Tolerance that was exceeded.
        tolerance: f64,
    },

    /// Joint diagonalization did not converge within the sweep bound.
    #[error(
        "JADE did not converge after {sweeps} sweeps ({rotations} rotations). \
         Consider increasing max_sweeps or threshold."
    )]
    NotConverged {
        /// Number of sweeps performed.
        sweeps: usize,
        /// Number of Givens rotations applied.
        rotations: usize,
    },

    /// Invalid configuration parameter.
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why it's invalid.
        message: String,
    },

    /// The spectral transform collaborator failed.
    #[error("Spectral transform error: {message}")]
    Transform {
        /// Description reported by the transform.
        message: String,
    },
}

impl JadeError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            JadeError::InvalidDimensions { .. } => ErrorKind::Dimension,
            JadeError::SingularMatrix { .. }
            | JadeError::ComputationError { .. }
            | JadeError::NonFinite { .. }
            | JadeError::LostUnitarity { .. } => ErrorKind::Numerical,
            JadeError::NotConverged { .. } => ErrorKind::NonConvergence,
            JadeError::InvalidConfig { .. } => ErrorKind::Config,
            JadeError::Transform { .. } => ErrorKind::Transform,
        }
    }

    pub(crate) fn dimensions(message: impl Into<String>) -> Self {
        JadeError::InvalidDimensions {
            message: message.into(),
        }
    }

    pub(crate) fn config(parameter: &str, message: impl Into<String>) -> Self {
        JadeError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with JadeError.
pub type Result<T> = std::result::Result<T, JadeError>;
