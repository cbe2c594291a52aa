//! CSD transform configuration.
//!
//! [`CsdConfig`] holds every tunable parameter of the transform. Defaults
//! match `mne.preprocessing.compute_current_source_density`.
use serde_json::Value;

use crate::error::{CsdError, Result};
use crate::geometry::Sphere;

/// Upper bound on `n_legendre_terms`.
pub const MAX_LEGENDRE_TERMS: usize = 10_000;

/// How the approximating head sphere is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SphereSpec {
    /// Least-squares fit to the EEG electrode positions of the container.
    Auto,
    /// Explicit `(x0, y0, z0, radius)` in the same unit as the positions.
    Fixed(Sphere),
}

impl SphereSpec {
    /// Explicit sphere from an MNE-style 4-tuple.
    pub fn fixed(x0: f64, y0: f64, z0: f64, radius: f64) -> Self {
        SphereSpec::Fixed(Sphere::new([x0, y0, z0], radius))
    }
}

/// Configuration for the spherical-spline CSD transform.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use exg_csd::{CsdConfig, SphereSpec};
///
/// let cfg = CsdConfig {
///     sphere: SphereSpec::fixed(0.0, 0.0, 0.0, 85.0),
///     n_legendre_terms: 20,
///     ..CsdConfig::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CsdConfig {
    /// Tikhonov regularisation added to the diagonal of the interpolation
    /// matrix G. Must lie strictly inside `(0, 1)`.
    ///
    /// Default: `1e-5`.
    pub lambda2: f64,

    /// Spline stiffness exponent `m`. G uses `m`, the Laplacian kernel H
    /// uses `m − 1`. Must be non-negative.
    ///
    /// Default: `4.0`.
    pub stiffness: f64,

    /// Number of Legendre terms in both series. Must lie in
    /// `1..=MAX_LEGENDRE_TERMS`.
    ///
    /// Default: `50`.
    pub n_legendre_terms: usize,

    /// Sphere used to project electrodes.
    ///
    /// Default: [`SphereSpec::Auto`].
    pub sphere: SphereSpec,

    /// Return a transformed copy (`true`) or modify the container in place.
    ///
    /// Only consulted by [`crate::apply_current_source_density`].
    ///
    /// Default: `true`.
    pub copy: bool,
}

impl Default for CsdConfig {
    fn default() -> Self {
        Self {
            lambda2: 1e-5,
            stiffness: 4.0,
            n_legendre_terms: 50,
            sphere: SphereSpec::Auto,
            copy: true,
        }
    }
}

impl CsdConfig {
    /// Range-check every hyperparameter and, when fixed, the sphere.
    pub fn validate(&self) -> Result<()> {
        if !(self.lambda2 > 0.0 && self.lambda2 < 1.0) {
            return Err(CsdError::ParameterRange(format!(
                "lambda2 must be between 0 and 1, got {}",
                self.lambda2
            )));
        }
        if !(self.stiffness >= 0.0) || !self.stiffness.is_finite() {
            return Err(CsdError::ParameterRange(format!(
                "stiffness must be non-negative got {}",
                self.stiffness
            )));
        }
        if self.n_legendre_terms < 1 {
            return Err(CsdError::ParameterRange(format!(
                "n_legendre_terms must be greater than 0, got {}",
                self.n_legendre_terms
            )));
        }
        if self.n_legendre_terms > MAX_LEGENDRE_TERMS {
            return Err(CsdError::ParameterRange(format!(
                "n_legendre_terms must be at most {MAX_LEGENDRE_TERMS}, got {}",
                self.n_legendre_terms
            )));
        }
        if let SphereSpec::Fixed(sphere) = &self.sphere {
            sphere.validate()?;
        }
        Ok(())
    }

    /// Parse a configuration from JSON text, e.g.
    /// `{"lambda2": 1e-5, "sphere": [0, 0, 0, 85], "copy": false}`.
    ///
    /// Missing keys take their defaults. Values of the wrong JSON type are
    /// reported as [`CsdError::TypeConstraint`]; the result is validated.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Same as [`CsdConfig::from_json`] on an already parsed value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| CsdError::type_constraint("config", "object", json_type(value)))?;

        let mut cfg = CsdConfig::default();
        for (key, v) in obj {
            match key.as_str() {
                "lambda2" => cfg.lambda2 = numeric("lambda2", v)?,
                "stiffness" => cfg.stiffness = numeric("stiffness", v)?,
                "n_legendre_terms" => cfg.n_legendre_terms = integer("n_legendre_terms", v)?,
                "sphere" => cfg.sphere = sphere_spec(v)?,
                "copy" => {
                    cfg.copy = v
                        .as_bool()
                        .ok_or_else(|| CsdError::type_constraint("copy", "bool", v.to_string()))?
                }
                other => log::warn!("ignoring unknown CSD config key {other:?}"),
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn numeric(name: &str, v: &Value) -> Result<f64> {
    v.as_f64()
        .ok_or_else(|| CsdError::type_constraint(name, "numeric", v.to_string()))
}

/// Integers only (`50`, not `50.0`); negative integers are a range error.
fn integer(name: &str, v: &Value) -> Result<usize> {
    if let Some(n) = v.as_u64() {
        return usize::try_from(n)
            .map_err(|_| CsdError::ParameterRange(format!("{name} is too large, got {n}")));
    }
    if let Some(n) = v.as_i64() {
        return Err(CsdError::ParameterRange(format!(
            "{name} must be greater than 0, got {n}"
        )));
    }
    Err(CsdError::type_constraint(name, "int", v.to_string()))
}

fn sphere_spec(v: &Value) -> Result<SphereSpec> {
    const EXPECTED: &str = "\"auto\" or [x, y, z, radius]";
    match v {
        Value::String(s) if s == "auto" => Ok(SphereSpec::Auto),
        Value::Array(items) if items.len() == 4 => {
            let mut p = [0.0_f64; 4];
            for (slot, (item, name)) in p.iter_mut().zip(items.iter().zip(["x", "y", "z", "radius"])) {
                *slot = item.as_f64().ok_or_else(|| {
                    CsdError::type_constraint(&format!("sphere {name}"), "numeric", item.to_string())
                })?;
            }
            Ok(SphereSpec::fixed(p[0], p[1], p[2], p[3]))
        }
        other => Err(CsdError::type_constraint("sphere", EXPECTED, other.to_string())),
    }
}
