// src/jade.rs

//! Joint approximate diagonalization of eigen-matrices by complex Givens rotations.
//!
//! Based on: Cardoso & Souloumiac, "Blind beamforming for non-Gaussian signals"
//! IEE Proceedings F, 1993.

use crate::error::{JadeError, Result};
use crate::math::{ensure_finite, unitarity_deviation};
use log::{debug, info};
use ndarray::{array, Array2};
use ndarray_linalg::{Eigh, UPLO};
use num_complex::Complex64;

/// Outcome of a joint diagonalization run.
#[derive(Debug, Clone)]
pub struct Diagonalization {
    /// Accumulated unitary change of basis V (m × m).
    pub rotation: Array2<Complex64>,
    /// Rotated eigen-matrices, stacked side by side (m × n_blocks·m).
    pub matrices: Array2<Complex64>,
    /// Number of sweeps performed.
    pub n_sweeps: usize,
    /// Number of Givens rotations applied.
    pub n_rotations: usize,
    /// Whether the last sweep applied no rotation.
    pub converged: bool,
}

/// Jointly diagonalizes a set of m × m matrices by a single unitary transform.
///
/// Owns both the stacked matrices M and the rotation accumulator V for the
/// whole run. Every accepted rotation G updates `V ← V·G` and each block
/// `M_b ← G^H·M_b·G`.
#[derive(Debug, Clone)]
pub struct JointDiagonalizer {
    matrices: Array2<Complex64>,
    rotation: Array2<Complex64>,
    n_blocks: usize,
    threshold: f64,
}

impl JointDiagonalizer {
    /// Create a diagonalizer for `n_blocks` matrices stacked side by side.
    ///
    /// # Arguments
    /// * `matrices` - Stacked matrices of shape (m, n_blocks · m)
    /// * `n_blocks` - Number of stacked matrices
    /// * `threshold` - Smallest rotation magnitude |s| worth applying
    pub fn new(matrices: Array2<Complex64>, n_blocks: usize, threshold: f64) -> Result<Self> {
        let m = matrices.nrows();
        if m == 0 || n_blocks == 0 || matrices.ncols() != n_blocks * m {
            return Err(JadeError::dimensions(format!(
                "expected {} stacked {}x{} matrices, got shape {:?}",
                n_blocks,
                m,
                m,
                matrices.shape()
            )));
        }
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(JadeError::config("threshold", "must be finite and positive"));
        }

        Ok(Self {
            matrices,
            rotation: Array2::eye(m),
            n_blocks,
            threshold,
        })
    }

    /// Number of rows/columns of each matrix.
    pub fn dim(&self) -> usize {
        self.matrices.nrows()
    }

    /// Current rotation accumulator V.
    pub fn rotation(&self) -> &Array2<Complex64> {
        &self.rotation
    }

    /// Current stacked matrices.
    pub fn matrices(&self) -> &Array2<Complex64> {
        &self.matrices
    }

    /// Sum over all blocks of the squared magnitudes of off-diagonal entries.
    pub fn off_diagonal_energy(&self) -> f64 {
        let m = self.dim();
        let mut energy = 0.0;
        for b in 0..self.n_blocks {
            for i in 0..m {
                for j in 0..m {
                    if i != j {
                        energy += self.matrices[[i, b * m + j]].norm_sqr();
                    }
                }
            }
        }
        energy
    }

    /// Perform one sweep over all pairs p < q.
    ///
    /// # Returns
    /// * Number of rotations applied
    pub fn sweep(&mut self) -> Result<usize> {
        let m = self.dim();
        let mut rotations = 0;

        for p in 0..m {
            for q in (p + 1)..m {
                let (c, s) = self.givens_parameters(p, q)?;
                if s.norm() > self.threshold {
                    self.rotate(p, q, c, s);
                    rotations += 1;
                }
            }
        }

        Ok(rotations)
    }

    /// Sweep until no rotation exceeds the threshold or `max_sweeps` is reached.
    ///
    /// Hitting the sweep bound is not an error: the current state is returned
    /// with `converged == false`.
    ///
    /// # Arguments
    /// * `max_sweeps` - Upper bound on the number of sweeps
    /// * `unitarity_tol` - Largest tolerated entry of `V^H V - I`
    pub fn run(mut self, max_sweeps: usize, unitarity_tol: f64) -> Result<Diagonalization> {
        let mut n_sweeps = 0;
        let mut n_rotations = 0;
        // Nothing to rotate with fewer than two rows.
        let mut converged = self.dim() < 2;

        while !converged && n_sweeps < max_sweeps {
            let rotations = self.sweep()?;
            n_sweeps += 1;
            n_rotations += rotations;

            debug!(
                "JADE sweep {}: {} rotations, off-diagonal energy = {:.4e}",
                n_sweeps,
                rotations,
                self.off_diagonal_energy()
            );

            if rotations == 0 {
                converged = true;
            } else {
                ensure_finite(&self.rotation, "rotation accumulator")?;
                let deviation = unitarity_deviation(&self.rotation);
                if deviation > unitarity_tol {
                    return Err(JadeError::LostUnitarity {
                        deviation,
                        tolerance: unitarity_tol,
                    });
                }
            }
        }

        if converged {
            info!(
                "JADE converged after {} sweeps ({} rotations)",
                n_sweeps, n_rotations
            );
        }

        Ok(Diagonalization {
            rotation: self.rotation,
            matrices: self.matrices,
            n_sweeps,
            n_rotations,
            converged,
        })
    }

    /// Compute the complex Givens parameters (c, s) for the pair (p, q).
    ///
    /// The optimal rotation is the dominant eigenvector of the real 3×3
    /// matrix `Re(B·g·g^H·B^H)`, with its first component made non-negative.
    /// When that matrix vanishes the identity (1, 0) is returned.
    fn givens_parameters(&self, p: usize, q: usize) -> Result<(f64, Complex64)> {
        let m = self.dim();

        let mut g = Array2::<Complex64>::zeros((3, self.n_blocks));
        for b in 0..self.n_blocks {
            let (ip, iq) = (b * m + p, b * m + q);
            g[[0, b]] = self.matrices[[p, ip]] - self.matrices[[q, iq]];
            g[[1, b]] = self.matrices[[p, iq]];
            g[[2, b]] = self.matrices[[q, ip]];
        }

        let bg = basis_change().dot(&g);
        let gram = bg.dot(&bg.t().mapv(|z| z.conj())).mapv(|z| z.re);

        let (values, vectors) = gram.eigh(UPLO::Lower).map_err(|e| JadeError::ComputationError {
            message: format!(
                "Givens angle eigenproblem for pair ({}, {}) failed: {}",
                p, q, e
            ),
        })?;

        // Already jointly diagonal on {p, q}
        if !(values[2] > 0.0) {
            return Ok((1.0, Complex64::new(0.0, 0.0)));
        }

        // Eigenvalues come back ascending: the last column is the dominant one.
        let mut angles = [vectors[[0, 2]], vectors[[1, 2]], vectors[[2, 2]]];
        if angles[0] < 0.0 {
            angles.iter_mut().for_each(|a| *a = -*a);
        }

        let c = (0.5 + angles[0] / 2.0).sqrt();
        let s = Complex64::new(angles[1], -angles[2]) * (0.5 / c);

        Ok((c, s))
    }

    /// Apply G = [[c, -s*], [s, c]] to V (columns p, q) and to every block of M.
    fn rotate(&mut self, p: usize, q: usize, c: f64, s: Complex64) {
        let m = self.dim();
        let s_conj = s.conj();

        // V[:, {p, q}] <- V[:, {p, q}] · G
        for i in 0..m {
            let (vp, vq) = (self.rotation[[i, p]], self.rotation[[i, q]]);
            self.rotation[[i, p]] = vp * c + vq * s;
            self.rotation[[i, q]] = vq * c - vp * s_conj;
        }

        // M[{p, q}, :] <- G^H · M[{p, q}, :]
        for j in 0..self.matrices.ncols() {
            let (mp, mq) = (self.matrices[[p, j]], self.matrices[[q, j]]);
            self.matrices[[p, j]] = mp * c + mq * s_conj;
            self.matrices[[q, j]] = mq * c - mp * s;
        }

        // M_b[:, {p, q}] <- M_b[:, {p, q}] · G
        for b in 0..self.n_blocks {
            let (ip, iq) = (b * m + p, b * m + q);
            for i in 0..m {
                let (mp, mq) = (self.matrices[[i, ip]], self.matrices[[i, iq]]);
                self.matrices[[i, ip]] = mp * c + mq * s;
                self.matrices[[i, iq]] = mq * c - mp * s_conj;
            }
        }
    }
}

/// Fixed basis change mapping the Hermitian 2×2 rotation generator onto a
/// real 3×3 eigenproblem.
fn basis_change() -> Array2<Complex64> {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let i = Complex64::new(0.0, 1.0);
    array![[one, zero, zero], [zero, one, one], [zero, -i, i]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cumulants::{cumulant_matrix, CumulantMethod};
    use crate::eigenmatrices::select_eigen_matrices;
    use crate::error::ErrorKind;
    use crate::math::adjoint;
    use crate::utils::mixed_sources;
    use crate::whitening::{center, whiten};
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::StandardNormal;

    fn eigen_matrices(n: usize, t: usize, seed: u64) -> Array2<Complex64> {
        let (_, _, x) = mixed_sources(n, t, seed);
        let (x, _) = center(&x);
        let y = whiten(&x, n).unwrap().data;
        let q = cumulant_matrix(&y, CumulantMethod::Batched).unwrap();
        select_eigen_matrices(&q, n, n).unwrap()
    }

    fn random_hermitian_stack(m: usize, n_blocks: usize, seed: u64) -> Array2<Complex64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut stacked = Array2::zeros((m, n_blocks * m));
        for b in 0..n_blocks {
            let a = Array2::from_shape_fn((m, m), |_| {
                Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal))
            });
            let h = &a + &adjoint(&a);
            for i in 0..m {
                for j in 0..m {
                    stacked[[i, b * m + j]] = h[[i, j]];
                }
            }
        }
        stacked
    }

    #[test]
    fn test_rotation_stays_unitary() {
        let mut diag = JointDiagonalizer::new(eigen_matrices(4, 2000, 42), 4, 1e-6).unwrap();

        for _ in 0..5 {
            for p in 0..4 {
                for q in (p + 1)..4 {
                    let (c, s) = diag.givens_parameters(p, q).unwrap();
                    assert!((c * c + s.norm_sqr() - 1.0).abs() < 1e-12);

                    diag.rotate(p, q, c, s);
                    assert!(
                        unitarity_deviation(diag.rotation()) < 1e-8,
                        "V lost unitarity"
                    );
                }
            }
        }
    }

    #[test]
    fn test_off_diagonal_energy_never_increases() {
        let mut diag = JointDiagonalizer::new(random_hermitian_stack(3, 5, 7), 5, 1e-9).unwrap();
        let total: f64 = diag.matrices().iter().map(|z| z.norm_sqr()).sum();

        for _ in 0..4 {
            for p in 0..3 {
                for q in (p + 1)..3 {
                    let before = diag.off_diagonal_energy();
                    let (c, s) = diag.givens_parameters(p, q).unwrap();
                    diag.rotate(p, q, c, s);
                    let after = diag.off_diagonal_energy();
                    assert!(
                        after <= before + 1e-10 * total,
                        "off-diagonal energy grew from {} to {}",
                        before,
                        after
                    );
                }
            }
        }
    }

    #[test]
    fn test_rotated_blocks_match_congruence() {
        let stacked = random_hermitian_stack(3, 2, 3);
        let diag = JointDiagonalizer::new(stacked.clone(), 2, 1e-9).unwrap();
        let result = diag.run(50, 1e-8).unwrap();

        let v = &result.rotation;
        for b in 0..2 {
            let block = stacked.slice(ndarray::s![.., b * 3..(b + 1) * 3]);
            let expected = adjoint(v).dot(&block).dot(v);
            for i in 0..3 {
                for j in 0..3 {
                    assert!((expected[[i, j]] - result.matrices[[i, b * 3 + j]]).norm() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_commuting_matrices_are_diagonalized() {
        // Matrices sharing the eigenbasis U can be diagonalized exactly
        let mut rng = StdRng::seed_from_u64(11);
        let a = Array2::from_shape_fn((3, 3), |_| {
            Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal))
        });
        let (_, u) = crate::math::hermitian_eigh(&(&a + &adjoint(&a)), "test").unwrap();

        let mut stacked = Array2::zeros((3, 9));
        for b in 0..3 {
            let d = Array2::from_diag(&ndarray::Array1::from_shape_fn(3, |i| {
                Complex64::new((i + 1) as f64 * (b as f64 - 1.3), 0.0)
            }));
            let block = u.dot(&d).dot(&adjoint(&u));
            for i in 0..3 {
                for j in 0..3 {
                    stacked[[i, b * 3 + j]] = block[[i, j]];
                }
            }
        }

        let diag = JointDiagonalizer::new(stacked, 3, 1e-10).unwrap();
        let result = diag.run(100, 1e-8).unwrap();
        assert!(result.converged);

        let residual = JointDiagonalizer::new(result.matrices, 3, 1e-10)
            .unwrap()
            .off_diagonal_energy();
        assert!(residual < 1e-12, "residual off-diagonal energy {}", residual);
    }

    #[test]
    fn test_sweeps_terminate() {
        let threshold = 1.0 / (100.0 * 1000f64.sqrt());
        let diag = JointDiagonalizer::new(eigen_matrices(3, 1000, 5), 3, threshold).unwrap();
        let result = diag.run(100, 1e-8).unwrap();

        assert!(result.converged);
        assert!(result.n_sweeps < 100);
        assert!(result.n_rotations > 0);
    }

    #[test]
    fn test_huge_threshold_leaves_identity() {
        let diag = JointDiagonalizer::new(eigen_matrices(3, 500, 2), 3, 1e6).unwrap();
        let result = diag.run(10, 1e-8).unwrap();

        assert!(result.converged);
        assert_eq!(result.n_sweeps, 1);
        assert_eq!(result.n_rotations, 0);
        assert_eq!(result.rotation, Array2::<Complex64>::eye(3));
    }

    #[test]
    fn test_sweep_bound_reports_non_convergence() {
        let diag = JointDiagonalizer::new(random_hermitian_stack(4, 6, 1), 6, 1e-14).unwrap();
        let result = diag.run(1, 1e-8).unwrap();

        assert!(!result.converged);
        assert_eq!(result.n_sweeps, 1);
        assert!(result.n_rotations > 0);
    }

    #[test]
    fn test_single_row_skips_sweeps() {
        let stacked = Array2::from_elem((1, 1), Complex64::new(2.0, 0.0));
        let result = JointDiagonalizer::new(stacked, 1, 1e-3)
            .unwrap()
            .run(10, 1e-8)
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.n_sweeps, 0);
        assert_eq!(result.rotation[[0, 0]], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_invalid_construction() {
        let stacked = Array2::<Complex64>::zeros((3, 8));
        assert!(matches!(
            JointDiagonalizer::new(stacked, 3, 1e-3),
            Err(JadeError::InvalidDimensions { .. })
        ));

        let stacked = Array2::<Complex64>::zeros((2, 4));
        assert!(matches!(
            JointDiagonalizer::new(stacked, 2, 0.0),
            Err(JadeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unitarity_tolerance_is_enforced() {
        let diag = JointDiagonalizer::new(random_hermitian_stack(3, 2, 3), 2, 1e-9).unwrap();
        let err = diag.run(10, 1e-300).unwrap_err();

        assert!(matches!(err, JadeError::LostUnitarity { .. }));
        assert_eq!(err.kind(), ErrorKind::Numerical);
    }

    #[test]
    fn test_scalar_blocks_need_no_rotation() {
        // Multiples of the identity give a vanishing angle problem for every pair
        let mut stacked = Array2::zeros((3, 6));
        for i in 0..3 {
            stacked[[i, i]] = Complex64::new(2.0, 0.0);
            stacked[[i, 3 + i]] = Complex64::new(-0.5, 0.0);
        }

        let diag = JointDiagonalizer::new(stacked.clone(), 2, 1e-12).unwrap();
        assert_eq!(
            diag.givens_parameters(0, 1).unwrap(),
            (1.0, Complex64::new(0.0, 0.0))
        );

        let result = diag.run(10, 1e-8).unwrap();
        assert!(result.converged);
        assert_eq!(result.n_sweeps, 1);
        assert_eq!(result.n_rotations, 0);
        assert_eq!(result.rotation, Array2::<Complex64>::eye(3));
        assert_eq!(result.matrices, stacked);
    }
}
