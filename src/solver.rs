//! Regularised spherical-spline solve.
//!
//! Matches `_prepare_G` / `_compute_csd` in `mne/preprocessing/_csd.py`,
//! itself a port of the CSD MATLAB toolbox (Kayser & Tenke):
//!
//! ```text
//! Gi  = (G + λ²·I)⁻¹
//! TC  = Σᵢ Gi[i, :]            column sums
//! sgi = Σ TC
//!
//! C   = Gi · X                 spline coefficients      X: [N, T]
//! c0  = Σᵢ C[i, :] / sgi       constant term (null-space constraint)
//! Y   = Hᵀ · (C − TC ⊗ c0) / r²  surface Laplacian           r: sphere radius
//! ```
//!
//! G and H live on the unit sphere; dividing by `r²` brings the Laplacian
//! back to the head sphere, so potentials in V give V/m² when `r` is in m.
//!
//! Every step is linear in `X` and independent of it, so the whole chain is
//! folded once into an `N × N` operator and applied as a single matrix
//! product per block.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{CsdError, Result};
use crate::kernel::SplineKernels;

/// Inverse of the regularised interpolation matrix plus its constraint terms.
#[derive(Debug, Clone)]
pub struct PreparedG {
    /// `(G + λ²·I)⁻¹`, `[N, N]`.
    pub gi: Array2<f64>,
    /// Column sums of `gi`, `[N]`.
    pub tc: Array1<f64>,
    /// Sum of all entries of `gi`.
    pub sgi: f64,
}

/// Add `lambda2` to the diagonal of `g` and invert (LU with partial pivoting).
pub fn prepare_g(g: &Array2<f64>, lambda2: f64) -> Result<PreparedG> {
    let n = g.nrows();
    if n == 0 || g.ncols() != n {
        return Err(CsdError::Solver(format!("G must be square and non-empty, got {:?}", g.dim())));
    }
    let reg = DMatrix::from_fn(n, n, |i, j| g[[i, j]] + if i == j { lambda2 } else { 0.0 });
    let inv = reg
        .lu()
        .try_inverse()
        .ok_or_else(|| CsdError::Solver("interpolation matrix G is singular".into()))?;
    let gi = Array2::from_shape_fn((n, n), |(i, j)| inv[(i, j)]);
    let tc = gi.sum_axis(Axis(0));
    let sgi = tc.sum();
    if !sgi.is_finite() || sgi == 0.0 {
        return Err(CsdError::Solver(format!("degenerate constraint term sgi = {sgi}")));
    }
    Ok(PreparedG { gi, tc, sgi })
}

/// Apply the constrained spline solve and Laplacian mapping to `data` (`[N, T]`)
/// on a sphere of `radius`.
pub fn compute_csd(
    data: ArrayView2<'_, f64>,
    prepared: &PreparedG,
    h: &Array2<f64>,
    radius: f64,
) -> Array2<f64> {
    let cp2 = prepared.gi.dot(&data);
    let c02 = cp2.sum_axis(Axis(0)) / prepared.sgi;
    let tc = prepared.tc.view().insert_axis(Axis(1));
    let c2 = &cp2 - &(&tc * &c02.view().insert_axis(Axis(0)));
    h.t().dot(&c2) / (radius * radius)
}

/// Data-independent `N × N` CSD operator for one electrode layout.
#[derive(Debug, Clone)]
pub struct CsdOperator {
    matrix: Array2<f64>,
}

impl CsdOperator {
    /// Fold kernels, regularisation and the `1/radius²` scale into a single
    /// linear map.
    pub fn new(kernels: &SplineKernels, lambda2: f64, radius: f64) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(CsdError::Geometry(format!(
                "sphere radius must be greater than 0, got {radius}"
            )));
        }
        let prepared = prepare_g(&kernels.g, lambda2)?;
        let eye = Array2::<f64>::eye(kernels.n_channels());
        let matrix = compute_csd(eye.view(), &prepared, &kernels.h, radius);
        Ok(Self { matrix })
    }

    /// The operator `T` such that `csd = T · data`.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn n_channels(&self) -> usize {
        self.matrix.nrows()
    }

    /// Transform one `[N, T]` block of EEG potentials.
    pub fn apply(&self, block: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if block.nrows() != self.n_channels() {
            return Err(CsdError::Solver(format!(
                "data block has {} channels, operator expects {}",
                block.nrows(),
                self.n_channels()
            )));
        }
        Ok(self.matrix.dot(&block))
    }
}
