//! Electrode geometry: validation, projection onto the unit sphere, and
//! head-sphere fitting.
//!
//! Positions are `[N, 3]` arrays in whatever unit the montage uses (metres
//! for FIF files, millimetres for the MATLAB CSD toolbox); the sphere must be
//! given in the same unit.
use nalgebra::{Matrix4, Vector4};
use ndarray::Array2;

use crate::error::{CsdError, Result};

/// Approximating head sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub origin: [f64; 3],
    pub radius: f64,
}

impl Sphere {
    pub fn new(origin: [f64; 3], radius: f64) -> Self {
        Self { origin, radius }
    }

    /// Radius must be finite and strictly positive, origin finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(CsdError::Geometry(format!(
                "sphere radius must be greater than 0, got {}",
                self.radius
            )));
        }
        if !self.origin.iter().all(|v| v.is_finite()) {
            return Err(CsdError::Geometry(format!(
                "sphere origin must be finite, got {:?}",
                self.origin
            )));
        }
        Ok(())
    }

    /// `(x0, y0, z0, radius)`, the MNE tuple layout.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        let [x, y, z] = self.origin;
        (x, y, z, self.radius)
    }
}

/// Reject positions with a non-finite component or all components ≈ 0.
///
/// "≈ 0" is `|v| <= 1e-8`, the absolute tolerance of `numpy.isclose`.
pub fn validate_positions(pos: &Array2<f64>) -> Result<()> {
    let finite = pos.iter().all(|v| v.is_finite());
    let any_zero = pos
        .rows()
        .into_iter()
        .any(|row| row.iter().all(|v| v.abs() <= 1e-8));
    if !finite || any_zero {
        return Err(CsdError::Geometry("Zero or infinite position found in chs".into()));
    }
    Ok(())
}

/// Reject positions that coincide with the sphere origin (centred norm ≈ 0).
pub fn validate_centered(pos: &Array2<f64>, sphere: &Sphere) -> Result<()> {
    for (i, row) in pos.rows().into_iter().enumerate() {
        let d2: f64 = row.iter().zip(sphere.origin).map(|(p, o)| (p - o) * (p - o)).sum();
        if !(d2.sqrt() > 1e-8) {
            return Err(CsdError::Geometry(format!(
                "EEG position {i} coincides with the sphere origin {:?}",
                sphere.origin
            )));
        }
    }
    Ok(())
}

/// Recenter on the sphere origin and normalise each row to unit length.
///
/// Assumes input that passed [`validate_centered`]: a row at the origin
/// divides by zero and yields non-finite directions.
pub fn project_to_unit_sphere(pos: &Array2<f64>, sphere: &Sphere) -> Array2<f64> {
    let mut unit = pos.to_owned();
    for mut row in unit.rows_mut() {
        for (v, o) in row.iter_mut().zip(sphere.origin) {
            *v -= o;
        }
        let norm = row.dot(&row).sqrt();
        row.mapv_inplace(|v| v / norm);
    }
    unit
}

/// Pairwise cosine of the angle between unit directions, clipped to `[-1, 1]`.
pub fn cosine_angles(unit: &Array2<f64>) -> Array2<f64> {
    unit.dot(&unit.t()).mapv(|c| c.clamp(-1.0, 1.0))
}

/// Least-squares sphere through `pos` (`[N, 3]`, N ≥ 4).
///
/// Solves the algebraic form `|p|² = 2 p·c + (r² − |c|²)` for centre `c` and
/// radius `r` via the 4×4 normal equations.
pub fn fit_sphere(pos: &Array2<f64>) -> Result<Sphere> {
    let n = pos.nrows();
    if n < 4 || pos.ncols() != 3 {
        return Err(CsdError::Geometry(format!(
            "at least 4 positions are needed to fit a sphere, got {n}"
        )));
    }

    let mut ata = Matrix4::<f64>::zeros();
    let mut atb = Vector4::<f64>::zeros();
    for row in pos.rows() {
        let a = Vector4::new(2.0 * row[0], 2.0 * row[1], 2.0 * row[2], 1.0);
        let b = row.dot(&row);
        ata += a * a.transpose();
        atb += a * b;
    }

    let sol = ata
        .try_inverse()
        .map(|inv| inv * atb)
        .ok_or_else(|| CsdError::Geometry("cannot fit a sphere to coplanar positions".into()))?;
    let origin = [sol[0], sol[1], sol[2]];
    let r2 = sol[3] + origin.iter().map(|c| c * c).sum::<f64>();
    let sphere = Sphere::new(origin, r2.max(0.0).sqrt());
    sphere.validate()?;

    // Residual spread relative to the radius, as a fit-quality hint.
    let spread = pos
        .rows()
        .into_iter()
        .map(|row| {
            let d: f64 = row.iter().zip(origin).map(|(p, o)| (p - o) * (p - o)).sum();
            (d.sqrt() - sphere.radius).abs()
        })
        .fold(0.0_f64, f64::max)
        / sphere.radius;
    if spread > 0.2 {
        log::warn!("electrodes deviate up to {:.0}% from the fitted sphere", spread * 100.0);
    }
    log::info!(
        "fitted sphere radius {:.4} origin ({:.4}, {:.4}, {:.4})",
        sphere.radius, origin[0], origin[1], origin[2]
    );
    Ok(sphere)
}
