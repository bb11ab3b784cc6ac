//! Utility functions for evaluating separation quality.

use ndarray::{Array2, ArrayView1};
use num_complex::Complex64;

/// Compute the Amari distance between an unmixing and a mixing matrix.
///
/// The Amari distance measures how close `W @ A` is to a permutation
/// and scaling matrix. It equals 0 when W perfectly unmixes A. Complex
/// scale factors are ignored since only magnitudes enter the measure.
///
/// # Arguments
/// * `w` - Unmixing matrix (m × n)
/// * `a` - Mixing matrix (n × m)
///
/// # Returns
/// * Amari distance (0 = perfect separation)
pub fn amari_distance(w: &Array2<Complex64>, a: &Array2<Complex64>) -> f64 {
    let p = w.dot(a);
    let n = p.nrows() as f64;

    let s = |r: &Array2<f64>| -> f64 {
        let mut sum = 0.0;
        for row in r.rows() {
            let row_sum: f64 = row.iter().sum();
            let row_max: f64 = row.iter().cloned().fold(0.0, f64::max);
            if row_max > 1e-15 {
                sum += row_sum / row_max - 1.0;
            }
        }
        sum
    };

    let p_sq = p.mapv(|z| z.norm_sqr());
    let p_sq_t = p_sq.t().to_owned();

    (s(&p_sq) + s(&p_sq_t)) / (2.0 * n)
}

/// Magnitude of the normalized inner product of every pair of rows.
///
/// Entry (i, j) is `|<e_i, t_j>| / (|e_i| |t_j|)`, which is 1 when row i of
/// `estimated` equals row j of `truth` up to a complex factor.
///
/// # Arguments
/// * `estimated` - Estimated signals (m × T)
/// * `truth` - Reference signals (k × T)
///
/// # Returns
/// * Correlation magnitudes (m × k)
pub fn source_correlation(
    estimated: &Array2<Complex64>,
    truth: &Array2<Complex64>,
) -> Array2<f64> {
    let norm =
        |row: ArrayView1<'_, Complex64>| row.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();

    let mut corr = Array2::zeros((estimated.nrows(), truth.nrows()));
    for (i, e) in estimated.rows().into_iter().enumerate() {
        for (j, t) in truth.rows().into_iter().enumerate() {
            let inner: Complex64 = e.iter().zip(t.iter()).map(|(a, b)| a * b.conj()).sum();
            let scale = norm(e) * norm(t);
            corr[[i, j]] = if scale > 0.0 { inner.norm() / scale } else { 0.0 };
        }
    }

    corr
}

/// Generate `n` independent non-Gaussian complex sources, a random complex
/// mixing matrix, and their mixture.
///
/// Source i is drawn from a distribution chosen by `i % 3`: QPSK symbols
/// (sub-Gaussian), exponential modulus with uniform phase (super-Gaussian),
/// or uniform on a square (mildly sub-Gaussian). All have unit power.
///
/// # Returns
/// * Tuple of (sources, mixing, mixture)
#[cfg(test)]
pub(crate) fn mixed_sources(
    n: usize,
    t: usize,
    seed: u64,
) -> (Array2<Complex64>, Array2<Complex64>, Array2<Complex64>) {
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::StandardNormal;
    use std::f64::consts::{FRAC_1_SQRT_2, TAU};

    let mut rng = StdRng::seed_from_u64(seed);
    let half_width = 1.5f64.sqrt();

    let mut s = Array2::zeros((n, t));
    for i in 0..n {
        for j in 0..t {
            s[[i, j]] = match i % 3 {
                0 => {
                    let re = if rng.gen::<bool>() { 1.0 } else { -1.0 };
                    let im = if rng.gen::<bool>() { 1.0 } else { -1.0 };
                    Complex64::new(re, im) * FRAC_1_SQRT_2
                }
                1 => {
                    let u: f64 = rng.gen_range(1e-12..1.0);
                    let theta: f64 = rng.gen_range(0.0..TAU);
                    Complex64::from_polar(-u.ln() * FRAC_1_SQRT_2, theta)
                }
                _ => Complex64::new(
                    rng.gen_range(-half_width..half_width),
                    rng.gen_range(-half_width..half_width),
                ),
            };
        }
    }

    let mut a = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            a[[i, j]] = Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal));
        }
    }

    let x = a.dot(&s);
    (s, a, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_linalg::Inverse;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_amari_distance_perfect() {
        // W = A^{-1} should give distance ~0
        let a = array![
            [c(1.0, 0.2), c(0.5, -0.1), c(0.2, 0.0)],
            [c(0.3, 0.0), c(1.0, 0.4), c(0.4, 0.3)],
            [c(0.1, -0.6), c(0.2, 0.0), c(1.0, 0.0)]
        ];

        let w = a.inv().unwrap();
        let dist = amari_distance(&w, &a);

        assert!(dist < 1e-10, "Amari distance should be ~0, got {}", dist);
    }

    #[test]
    fn test_amari_distance_scaled_permutation() {
        // Permuted inverse with complex row scales should also give distance ~0
        let a = array![[c(1.0, 0.0), c(0.5, 0.5)], [c(0.3, -0.2), c(1.0, 0.0)]];
        let w_inv = a.inv().unwrap();

        let phase = c(0.0, 2.0);
        let w = array![
            [w_inv[[1, 0]] * phase, w_inv[[1, 1]] * phase],
            [w_inv[[0, 0]], w_inv[[0, 1]]]
        ];

        let dist = amari_distance(&w, &a);
        assert!(dist < 1e-10, "Amari distance should be ~0, got {}", dist);
    }

    #[test]
    fn test_amari_distance_mixing() {
        let a = array![[c(1.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(-1.0, 0.0)]];
        let w = Array2::<Complex64>::eye(2);
        assert!(amari_distance(&w, &a) > 0.5);
    }

    #[test]
    fn test_source_correlation() {
        let truth = array![
            [c(1.0, 0.0), c(-1.0, 0.0), c(0.0, 1.0), c(0.0, -1.0)],
            [c(1.0, 0.0), c(1.0, 0.0), c(-1.0, 0.0), c(-1.0, 0.0)]
        ];
        let scale = c(0.0, -3.0);
        let estimated = array![
            [
                truth[[1, 0]] * scale,
                truth[[1, 1]] * scale,
                truth[[1, 2]] * scale,
                truth[[1, 3]] * scale
            ],
            [truth[[0, 0]], truth[[0, 1]], truth[[0, 2]], truth[[0, 3]]]
        ];

        let corr = source_correlation(&estimated, &truth);
        assert!((corr[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((corr[[1, 0]] - 1.0).abs() < 1e-12);
        assert!(corr[[0, 0]] < 1e-12);
        assert!(corr[[1, 1]] < 1e-12);
    }

    #[test]
    fn test_mixed_sources_have_unit_power() {
        let (s, a, x) = mixed_sources(3, 20_000, 1);
        assert_eq!(a.dim(), (3, 3));
        assert_eq!(x.dim(), (3, 20_000));

        for row in s.rows() {
            let power = row.iter().map(|z| z.norm_sqr()).sum::<f64>() / row.len() as f64;
            assert!((power - 1.0).abs() < 0.06, "power {}", power);
        }
    }
}
