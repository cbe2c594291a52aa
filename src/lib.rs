//! # exg-csd: spherical-spline Current Source Density for EEG
//!
//! `exg-csd` computes the surface Laplacian (Current Source Density, V/m²)
//! of scalp EEG with the spherical-spline method of Perrin et al. (1989).
//! The numerics follow `mne.preprocessing.compute_current_source_density`,
//! which in turn replicates the CSD MATLAB toolbox (Kayser & Tenke).
//!
//! ## Pipeline overview
//!
//! ```text
//! Raw / Epochs / Evoked
//!   │
//!   ├─ state guard            refuse data already marked CSD
//!   ├─ channel selection      EEG picks, no bad EEG channels
//!   ├─ geometry               finite, non-zero positions; sphere (fixed | fitted)
//!   ├─ kernel::SplineKernels  G (stiffness m) and H (m − 1), Legendre series
//!   ├─ solver::CsdOperator    (G + λ²I)⁻¹ with the constant-term constraint,
//!   │                         scaled by 1/r², folded into one N × N operator
//!   │                         (cached per layout)
//!   ├─ transform blocks       [C, T] once, or each trial of [E, C, T] in parallel
//!   └─ metadata               coil_type = EEG_CSD, unit = V/m², custom_ref = CSD
//! ```
//!
//! ## Quick start
//!
//! ```
//! use exg_csd::{compute_current_source_density, ChannelInfo, ChannelType, CsdConfig, MeasInfo, Raw, SphereSpec};
//! use ndarray::Array2;
//!
//! // 32 electrodes on the upper half of a 9 cm sphere.
//! let chs: Vec<ChannelInfo> = (0..32)
//!     .map(|i| {
//!         let (az, el) = (i as f64 * 2.4, 0.2 + 1.2 * i as f64 / 32.0);
//!         ChannelInfo::eeg(&format!("E{i}"), [0.09 * el.cos() * az.cos(), 0.09 * el.cos() * az.sin(), 0.09 * el.sin()])
//!     })
//!     .collect();
//! let info = MeasInfo::new(chs, 256.0);
//! let data = Array2::from_shape_fn((32, 256), |(c, t)| ((c + t) as f64 * 0.1).sin() * 1e-5);
//! let raw = Raw::new(info, data).unwrap();
//!
//! let cfg = CsdConfig { sphere: SphereSpec::fixed(0.0, 0.0, 0.0, 0.09), ..CsdConfig::default() };
//! let csd = compute_current_source_density(&raw, &cfg).unwrap();
//!
//! assert_eq!(csd.data.dim(), raw.data.dim());
//! assert_eq!(csd.info.pick_type(ChannelType::Csd).len(), 32);
//! ```
//!
//! ## Running individual steps
//!
//! ```
//! use exg_csd::geometry::{cosine_angles, project_to_unit_sphere, Sphere};
//! use exg_csd::kernel::SplineKernels;
//! use exg_csd::solver::CsdOperator;
//! use ndarray::array;
//!
//! let pos = array![[0.0, 0.0, 1.0], [0.9, 0.0, 0.4], [-0.4, 0.8, 0.4], [-0.4, -0.8, 0.4], [0.6, 0.6, 0.5]];
//! let unit = project_to_unit_sphere(&pos, &Sphere::new([0.0; 3], 1.0));
//! let kernels = SplineKernels::build(&cosine_angles(&unit), 4.0, 50).unwrap();
//! let op = CsdOperator::new(&kernels, 1e-5, 1.0).unwrap();
//! assert_eq!(op.matrix().dim(), (5, 5));
//! ```

pub mod cache;
pub mod config;
pub mod csd;
pub mod error;
pub mod fiff;
pub mod geometry;
pub mod inst;
pub mod kernel;
pub mod solver;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{CsdConfig, SphereSpec};

// csd: the transform itself
pub use csd::{
    apply_current_source_density, compute_current_source_density,
    compute_current_source_density_cached, compute_current_source_density_inplace, Csd,
};

// error
pub use error::{CsdError, Result};

// fiff: channel metadata
pub use fiff::{ChannelInfo, ChannelType, MeasInfo};

// geometry
pub use geometry::{fit_sphere, Sphere};

// inst: containers
pub use inst::{CsdTarget, Epochs, Evoked, Raw, Recording, SampleBlocks};

// cache / solver
pub use cache::{KernelCache, SplineParams};
pub use kernel::SplineKernels;
pub use solver::CsdOperator;
