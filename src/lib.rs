// src/lib.rs

//! # cjade
//!
//! Blind separation of complex-valued signals with JADE (Joint Approximate
//! Diagonalization of Eigen-matrices).
//!
//! This crate implements the algorithm from:
//!
//! > Jean-François Cardoso, Antoine Souloumiac.
//! > "Blind beamforming for non-Gaussian signals"
//! > IEE Proceedings F, 1993
//!
//! The observations are whitened, a fourth-order cumulant matrix is built
//! from the whitened data, its dominant eigen-matrices are extracted and a
//! unitary rotation jointly diagonalizing them is found with complex Givens
//! rotations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cjade::{Jade, JadeConfig};
//! use ndarray::Array2;
//! use num_complex::Complex64;
//!
//! # fn main() -> Result<(), cjade::JadeError> {
//! // Observations (n_sensors x n_samples)
//! let x = Array2::<Complex64>::zeros((4, 1000));
//!
//! // Separate with default settings
//! let result = Jade::separate(&x)?;
//!
//! // Or with custom configuration
//! let config = JadeConfig::builder()
//!     .n_components(2)
//!     .n_eigen_matrices(4)
//!     .max_sweeps(100)
//!     .build();
//! let result = Jade::separate_with_config(&x, &config)?;
//!
//! // Access results
//! let sources = &result.sources;
//! let mixing = &result.mixing;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod math;
mod result;
mod solver;

pub mod cumulants;
pub mod eigenmatrices;
pub mod jade;
pub mod separation;
pub mod whitening;

pub use config::{ConfigBuilder, JadeConfig};
pub use cumulants::CumulantMethod;
pub use error::{ErrorKind, JadeError, Result};
pub use jade::{Diagonalization, JointDiagonalizer};
pub use result::JadeResult;
pub use separation::{
    separate_signal, separate_spectrum, RelativePhaseSpectrum, SeparatedSignals,
    SeparationConfig, SpectralEstimate, SpectralSeparation, SpectralTransform,
};
pub use solver::Jade;
pub use whitening::Whitening;

// Utility functions
pub mod utils;

// Re-export the array types used in the public API
pub use ndarray;
pub use num_complex;
