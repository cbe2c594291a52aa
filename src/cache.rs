//! Explicit cache of CSD operators keyed by electrode layout.
//!
//! The operator depends only on the EEG positions, the sphere and the three
//! hyperparameters, so transforming many recordings that share a montage
//! needs one kernel build and one matrix inversion in total.
use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array2;

use crate::error::Result;
use crate::geometry::{cosine_angles, project_to_unit_sphere, Sphere};
use crate::kernel::SplineKernels;
use crate::solver::CsdOperator;

/// Hyperparameters that shape the operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineParams {
    pub lambda2: f64,
    pub stiffness: f64,
    pub n_legendre_terms: usize,
}

/// Bit-exact identity of one layout + parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutKey {
    positions: Vec<u64>,
    sphere: [u64; 4],
    lambda2: u64,
    stiffness: u64,
    n_legendre_terms: usize,
}

impl LayoutKey {
    pub fn new(pos: &Array2<f64>, sphere: &Sphere, params: &SplineParams) -> Self {
        let (x, y, z, r) = sphere.as_tuple();
        Self {
            positions: pos.iter().map(|v| v.to_bits()).collect(),
            sphere: [x.to_bits(), y.to_bits(), z.to_bits(), r.to_bits()],
            lambda2: params.lambda2.to_bits(),
            stiffness: params.stiffness.to_bits(),
            n_legendre_terms: params.n_legendre_terms,
        }
    }
}

/// Project → cosine matrix → G/H → folded operator scaled by `1/radius²`.
///
/// `pos` must already have passed [`crate::geometry::validate_positions`].
pub fn build_operator(pos: &Array2<f64>, sphere: &Sphere, params: &SplineParams) -> Result<CsdOperator> {
    let unit = project_to_unit_sphere(pos, sphere);
    let cosang = cosine_angles(&unit);
    let kernels = SplineKernels::build(&cosang, params.stiffness, params.n_legendre_terms)?;
    CsdOperator::new(&kernels, params.lambda2, sphere.radius)
}

/// Operators built so far, keyed by [`LayoutKey`].
#[derive(Debug, Default)]
pub struct KernelCache {
    entries: HashMap<LayoutKey, Arc<CsdOperator>>,
    hits: usize,
    misses: usize,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached operator for this layout, building it on a miss.
    pub fn operator(
        &mut self,
        pos: &Array2<f64>,
        sphere: &Sphere,
        params: &SplineParams,
    ) -> Result<Arc<CsdOperator>> {
        let key = LayoutKey::new(pos, sphere, params);
        if let Some(op) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("CSD operator cache hit ({} channels)", op.n_channels());
            return Ok(Arc::clone(op));
        }
        self.misses += 1;
        let op = Arc::new(build_operator(pos, sphere, params)?);
        self.entries.insert(key, Arc::clone(&op));
        Ok(op)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since construction or the last [`KernelCache::clear`].
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
