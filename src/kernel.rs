//! Spherical-spline kernels (Perrin et al., 1989).
//!
//! For electrodes `i`, `j` with cosine angle `x = cos θᵢⱼ`:
//!
//! ```text
//! g(x) = 1/4π · Σₙ₌₁..ᴺ (2n+1) / (nᵐ (n+1)ᵐ)       · Pₙ(x)     interpolation
//! h(x) = 1/4π · Σₙ₌₁..ᴺ (2n+1) / (nᵐ⁻¹ (n+1)ᵐ⁻¹)   · Pₙ(x)     surface Laplacian
//! ```
//!
//! `m` is the stiffness and `N` the number of Legendre terms. Both kernels
//! match `_calc_g` / `_calc_h` in `mne/preprocessing/_csd.py`.
use std::f64::consts::PI;

use ndarray::Array2;

use crate::config::MAX_LEGENDRE_TERMS;
use crate::error::{CsdError, Result};

/// Evaluate the Legendre series `Σₖ c[k]·Pₖ(x)`.
///
/// Same semantics as `numpy.polynomial.legendre.legval` for scalar `x`.
/// Uses the Bonnet recurrence `(n+1)Pₙ₊₁ = (2n+1)x Pₙ − n Pₙ₋₁`.
///
/// ```
/// use exg_csd::kernel::legval;
/// // P₂(x) = (3x² − 1) / 2
/// let x = 0.3;
/// assert!((legval(x, &[0.0, 0.0, 1.0]) - (3.0 * x * x - 1.0) / 2.0).abs() < 1e-15);
/// ```
pub fn legval(x: f64, coeffs: &[f64]) -> f64 {
    let Some((&c0, rest)) = coeffs.split_first() else {
        return 0.0;
    };
    let mut acc = c0;
    let (mut p_prev, mut p) = (1.0, x);
    for (n, &c) in rest.iter().enumerate() {
        acc += c * p;
        let n = (n + 1) as f64;
        let p_next = ((2.0 * n + 1.0) * x * p - n * p_prev) / (n + 1.0);
        p_prev = p;
        p = p_next;
    }
    acc
}

/// Series coefficients `[0, a₁, …, a_N]` with `aₙ = (2n+1) / (nᵉ (n+1)ᵉ 4π)`.
///
/// The leading 0 drops P₀, so the kernels carry no constant term.
pub fn series_coefficients(exponent: f64, n_terms: usize) -> Vec<f64> {
    std::iter::once(0.0)
        .chain((1..=n_terms).map(|n| {
            let n = n as f64;
            (2.0 * n + 1.0) / (n.powf(exponent) * (n + 1.0).powf(exponent) * 4.0 * PI)
        }))
        .collect()
}

/// Interpolation kernel G evaluated element-wise on a cosine matrix.
pub fn calc_g(cosang: &Array2<f64>, stiffness: f64, n_terms: usize) -> Array2<f64> {
    let c = series_coefficients(stiffness, n_terms);
    cosang.mapv(|x| legval(x, &c))
}

/// Laplacian kernel H evaluated element-wise on a cosine matrix.
pub fn calc_h(cosang: &Array2<f64>, stiffness: f64, n_terms: usize) -> Array2<f64> {
    let c = series_coefficients(stiffness - 1.0, n_terms);
    cosang.mapv(|x| legval(x, &c))
}

/// The G/H pair for one electrode layout. Depends only on geometry and
/// hyperparameters, never on the data.
#[derive(Debug, Clone)]
pub struct SplineKernels {
    pub g: Array2<f64>,
    pub h: Array2<f64>,
}

impl SplineKernels {
    /// Build both kernels from a square cosine matrix.
    pub fn build(cosang: &Array2<f64>, stiffness: f64, n_terms: usize) -> Result<Self> {
        if n_terms < 1 {
            return Err(CsdError::ParameterRange(format!(
                "n_legendre_terms must be greater than 0, got {n_terms}"
            )));
        }
        if n_terms > MAX_LEGENDRE_TERMS {
            return Err(CsdError::ParameterRange(format!(
                "n_legendre_terms must be at most {MAX_LEGENDRE_TERMS}, got {n_terms}"
            )));
        }
        if !(stiffness >= 0.0) {
            return Err(CsdError::ParameterRange(format!(
                "stiffness must be non-negative got {stiffness}"
            )));
        }
        if cosang.nrows() != cosang.ncols() {
            return Err(CsdError::Solver(format!(
                "cosine matrix must be square, got {:?}",
                cosang.dim()
            )));
        }
        log::debug!(
            "building spline kernels: {} channels, stiffness={stiffness}, n_terms={n_terms}",
            cosang.nrows()
        );
        Ok(Self {
            g: calc_g(cosang, stiffness, n_terms),
            h: calc_h(cosang, stiffness, n_terms),
        })
    }

    pub fn n_channels(&self) -> usize {
        self.g.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn legval_matches_closed_forms() {
        for &x in &[-1.0f64, -0.4, 0.0, 0.25, 0.9, 1.0] {
            let p3 = (5.0 * x * x * x - 3.0 * x) / 2.0;
            let p4 = (35.0 * x.powi(4) - 30.0 * x * x + 3.0) / 8.0;
            approx::assert_abs_diff_eq!(legval(x, &[0.0, 0.0, 0.0, 1.0]), p3, epsilon = 1e-14);
            approx::assert_abs_diff_eq!(legval(x, &[2.0, 0.0, 0.0, 0.0, 1.0]), 2.0 + p4, epsilon = 1e-14);
            approx::assert_abs_diff_eq!(legval(x, &[0.5, -1.0]), 0.5 - x, epsilon = 1e-15);
        }
        assert_eq!(legval(0.3, &[]), 0.0);
    }

    #[test]
    fn legendre_at_one_sums_coefficients() {
        // Pₙ(1) = 1 for every n.
        let c = series_coefficients(4.0, 50);
        approx::assert_abs_diff_eq!(legval(1.0, &c), c.iter().sum::<f64>(), epsilon = 1e-15);
    }

    #[test]
    fn coefficients_follow_stiffness() {
        let c = series_coefficients(4.0, 3);
        assert_eq!(c.len(), 4);
        assert_eq!(c[0], 0.0);
        approx::assert_abs_diff_eq!(c[1], 3.0 / (16.0 * 4.0 * PI), epsilon = 1e-15);
        approx::assert_abs_diff_eq!(c[2], 5.0 / (16.0 * 81.0 * 4.0 * PI), epsilon = 1e-15);
        let h = series_coefficients(3.0, 1);
        approx::assert_abs_diff_eq!(h[1], 3.0 / (8.0 * 4.0 * PI), epsilon = 1e-15);
    }

    #[test]
    fn kernels_are_symmetric_with_constant_diagonal() {
        let cos = array![[1.0, 0.2, -0.5], [0.2, 1.0, 0.7], [-0.5, 0.7, 1.0]];
        let k = SplineKernels::build(&cos, 4.0, 20).unwrap();
        assert_eq!(k.n_channels(), 3);
        for i in 0..3 {
            approx::assert_abs_diff_eq!(k.g[[i, i]], k.g[[0, 0]], epsilon = 1e-15);
            for j in 0..3 {
                assert_eq!(k.g[[i, j]], k.g[[j, i]]);
                assert_eq!(k.h[[i, j]], k.h[[j, i]]);
            }
        }
        // H weights higher orders more strongly than G.
        assert!(k.h[[0, 0]] > k.g[[0, 0]]);
    }

    #[test]
    fn build_rejects_bad_parameters() {
        let cos = array![[1.0]];
        assert!(matches!(SplineKernels::build(&cos, 4.0, 0), Err(CsdError::ParameterRange(_))));
        assert!(matches!(SplineKernels::build(&cos, -1.0, 7), Err(CsdError::ParameterRange(_))));
        assert!(matches!(
            SplineKernels::build(&cos, 4.0, usize::MAX),
            Err(CsdError::ParameterRange(_))
        ));
        let rect = Array2::<f64>::zeros((2, 3));
        assert!(matches!(SplineKernels::build(&rect, 4.0, 7), Err(CsdError::Solver(_))));
    }
}
