//! Current Source Density transform of recording containers.
//!
//! Matches `mne.preprocessing.compute_current_source_density`:
//!
//! 1. Refuse containers already marked `FIFFV_MNE_CUSTOM_REF_CSD`.
//! 2. Pick EEG channels; refuse bad EEG channels and EEG-less recordings.
//! 3. Range-check `lambda2`, `stiffness`, `n_legendre_terms` and the sphere.
//! 4. Check the sample array against `info`; reject zero / non-finite
//!    electrode positions; fit the sphere if `Auto`; reject electrodes at the
//!    sphere origin.
//! 5. Build (or fetch) the `N × N` CSD operator for the layout.
//! 6. Transform every `[C, T]` block (each trial for epochs).
//! 7. Mark EEG channels as CSD (`coil_type`, `unit`) and set the applied flag.
//!
//! Steps 1–5 run before the container is touched, so an error never leaves a
//! partially transformed recording, even in place.
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use ndarray::{Array2, ArrayViewMut2, Axis};
use rayon::prelude::*;

use crate::cache::{KernelCache, SplineParams};
use crate::config::{CsdConfig, SphereSpec};
use crate::error::{CsdError, Result};
use crate::fiff::constants::{FIFFV_COIL_EEG_CSD, FIFFV_MNE_CUSTOM_REF_CSD, FIFF_UNIT_V_M2};
use crate::fiff::MeasInfo;
use crate::geometry::{fit_sphere, validate_centered, validate_positions, Sphere};
use crate::inst::{CsdTarget, SampleBlocks};
use crate::solver::CsdOperator;

/// Everything decided before any sample is written.
struct Plan {
    picks: Vec<usize>,
    operator: Arc<CsdOperator>,
}

/// EEG electrode positions `[N, 3]` of `picks`.
fn eeg_positions(info: &MeasInfo, picks: &[usize]) -> Array2<f64> {
    Array2::from_shape_fn((picks.len(), 3), |(i, k)| info.chs[picks[i]].pos()[k])
}

fn plan<R: CsdTarget>(inst: &R, cfg: &CsdConfig, cache: &mut KernelCache) -> Result<Plan> {
    let info = inst.info();
    if info.csd_applied() {
        return Err(CsdError::AlreadyApplied);
    }

    let picks = info.pick_eeg();
    if !info.bads_among(&picks).is_empty() {
        return Err(CsdError::ChannelSelection(
            "CSD cannot be computed with bad EEG channels. Either drop \
             (remove the channels listed in bads) or interpolate \
             (interpolate_bads) bad EEG channels."
                .into(),
        ));
    }
    if picks.is_empty() {
        return Err(CsdError::ChannelSelection("No EEG channels found.".into()));
    }

    cfg.validate()?;
    inst.check_shape()?;

    let pos = eeg_positions(info, &picks);
    validate_positions(&pos)?;

    let sphere: Sphere = match cfg.sphere {
        SphereSpec::Fixed(sphere) => sphere,
        SphereSpec::Auto => fit_sphere(&pos)?,
    };
    validate_centered(&pos, &sphere)?;

    let params = SplineParams {
        lambda2: cfg.lambda2,
        stiffness: cfg.stiffness,
        n_legendre_terms: cfg.n_legendre_terms,
    };
    let operator = cache.operator(&pos, &sphere, &params)?;
    Ok(Plan { picks, operator })
}

/// Replace the EEG rows of one `[C, T]` block by their CSD.
fn transform_block(mut block: ArrayViewMut2<'_, f64>, picks: &[usize], op: &CsdOperator) -> Result<()> {
    let eeg = block.select(Axis(0), picks);
    let csd = op.apply(eeg.view())?;
    for (row, &pick) in csd.rows().into_iter().zip(picks) {
        block.row_mut(pick).assign(&row);
    }
    Ok(())
}

fn execute<R: CsdTarget>(inst: &mut R, plan: &Plan) -> Result<()> {
    let picks = plan.picks.as_slice();
    let op = plan.operator.as_ref();
    let n_blocks = match inst.blocks_mut() {
        SampleBlocks::Single(block) => {
            transform_block(block, picks, op)?;
            1
        }
        SampleBlocks::Trials(mut trials) => {
            let n = trials.len_of(Axis(0));
            trials
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .try_for_each(|trial| transform_block(trial, picks, op))?;
            n
        }
    };

    let info = inst.info_mut();
    for &pick in picks {
        let ch = &mut info.chs[pick];
        ch.coil_type = FIFFV_COIL_EEG_CSD;
        ch.unit = FIFF_UNIT_V_M2;
    }
    info.custom_ref_applied = FIFFV_MNE_CUSTOM_REF_CSD;

    log::info!(
        "applied CSD to {} EEG channels of {} ({} block{})",
        picks.len(),
        R::KIND,
        n_blocks,
        if n_blocks == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Return a CSD-transformed copy of `inst`; `inst` is left untouched.
///
/// `cfg.copy` is not consulted.
///
/// # Errors
///
/// * [`CsdError::AlreadyApplied`]: `inst` already carries CSD data.
/// * [`CsdError::ChannelSelection`]: no EEG channels, or bad EEG channels.
/// * [`CsdError::ParameterRange`]: `lambda2 ∉ (0, 1)`, `stiffness < 0`,
///   `n_legendre_terms == 0`.
/// * [`CsdError::Geometry`]: zero / infinite positions, invalid sphere,
///   an electrode at the sphere origin.
/// * [`CsdError::Shape`]: `info` and the samples disagree on the channel count.
/// * [`CsdError::Solver`]: singular interpolation matrix.
///
/// # Examples
///
/// ```no_run
/// use exg_csd::{compute_current_source_density, CsdConfig, SphereSpec, Epochs};
///
/// # fn load() -> Epochs { unimplemented!() }
/// let epochs: Epochs = load();
/// let cfg = CsdConfig { sphere: SphereSpec::fixed(0.0, 0.0, 0.0, 85.0), ..CsdConfig::default() };
/// let csd = compute_current_source_density(&epochs, &cfg).unwrap();
/// assert_eq!(csd.data.shape(), epochs.data.shape());
/// ```
pub fn compute_current_source_density<R: CsdTarget + Clone>(inst: &R, cfg: &CsdConfig) -> Result<R> {
    let mut cache = KernelCache::new();
    let plan = plan(inst, cfg, &mut cache)?;
    let mut out = inst.clone();
    execute(&mut out, &plan)?;
    Ok(out)
}

/// Transform `inst` in place. On error `inst` is unchanged.
///
/// `cfg.copy` is not consulted.
pub fn compute_current_source_density_inplace<R: CsdTarget>(inst: &mut R, cfg: &CsdConfig) -> Result<()> {
    let mut cache = KernelCache::new();
    compute_current_source_density_cached(inst, cfg, &mut cache)
}

/// Transform `inst` in place, reusing operators from `cache` for layouts
/// seen before.
pub fn compute_current_source_density_cached<R: CsdTarget>(
    inst: &mut R,
    cfg: &CsdConfig,
    cache: &mut KernelCache,
) -> Result<()> {
    let plan = plan(&*inst, cfg, cache)?;
    execute(inst, &plan)
}

/// Result of [`apply_current_source_density`]: a new container or the
/// caller's, depending on `cfg.copy`.
#[derive(Debug)]
pub enum Csd<'a, R> {
    Copied(R),
    InPlace(&'a mut R),
}

impl<R: Clone> Csd<'_, R> {
    /// The transformed container by value (clones when in place).
    pub fn into_owned(self) -> R {
        match self {
            Csd::Copied(r) => r,
            Csd::InPlace(r) => r.clone(),
        }
    }
}

impl<R> Deref for Csd<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        match self {
            Csd::Copied(r) => r,
            Csd::InPlace(r) => r,
        }
    }
}

impl<R> DerefMut for Csd<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        match self {
            Csd::Copied(r) => r,
            Csd::InPlace(r) => r,
        }
    }
}

/// Transform honouring `cfg.copy`: a copy when `true`, `inst` itself when
/// `false`.
pub fn apply_current_source_density<'a, R: CsdTarget + Clone>(
    inst: &'a mut R,
    cfg: &CsdConfig,
) -> Result<Csd<'a, R>> {
    if cfg.copy {
        compute_current_source_density(&*inst, cfg).map(Csd::Copied)
    } else {
        compute_current_source_density_inplace(inst, cfg)?;
        Ok(Csd::InPlace(inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiff::constants::*;
    use crate::fiff::{ChannelInfo, ChannelType};
    use crate::inst::{Epochs, Evoked, Raw};
    use ndarray::Array3;

    /// `n` electrodes spread over the upper hemisphere (radius 0.09 m).
    fn montage(n: usize) -> Vec<ChannelInfo> {
        (0..n)
            .map(|i| {
                let az = i as f64 * 2.399_963;
                let el = 0.15 + 1.3 * (i as f64 / n as f64);
                let p = [0.09 * el.cos() * az.cos(), 0.09 * el.cos() * az.sin(), 0.09 * el.sin()];
                ChannelInfo::eeg(&format!("E{i}"), p)
            })
            .collect()
    }

    fn raw(n_eeg: usize, n_t: usize) -> Raw {
        let mut chs = montage(n_eeg);
        chs.push(ChannelInfo::stim("STI 014"));
        let n = chs.len();
        let info = MeasInfo::new(chs, 250.0);
        let data = Array2::from_shape_fn((n, n_t), |(c, t)| ((c * 13 + t * 5) as f64 * 0.21).sin() * 1e-5);
        Raw::new(info, data).unwrap()
    }

    fn cfg() -> CsdConfig {
        CsdConfig { sphere: SphereSpec::fixed(0.0, 0.0, 0.0, 0.09), ..CsdConfig::default() }
    }

    #[test]
    fn marks_eeg_channels_and_state() {
        let raw = raw(16, 32);
        let out = compute_current_source_density(&raw, &cfg()).unwrap();
        assert_eq!(out.info.custom_ref_applied, FIFFV_MNE_CUSTOM_REF_CSD);
        for i in 0..16 {
            assert_eq!(out.info.channel_type(i), ChannelType::Csd);
            assert_eq!(out.info.chs[i].unit, FIFF_UNIT_V_M2);
            assert_eq!(out.info.chs[i].kind, FIFFV_EEG_CH);
        }
        assert_eq!(out.info.chs[16], raw.info.chs[16]);
        assert_eq!(out.data.row(16), raw.data.row(16));
        // Source untouched.
        assert_eq!(raw.info.custom_ref_applied, FIFFV_MNE_CUSTOM_REF_OFF);
    }

    #[test]
    fn reapplication_is_refused() {
        let out = compute_current_source_density(&raw(8, 8), &cfg()).unwrap();
        assert!(matches!(
            compute_current_source_density(&out, &cfg()),
            Err(CsdError::AlreadyApplied)
        ));
    }

    #[test]
    fn state_checked_before_parameters() {
        let mut out = compute_current_source_density(&raw(8, 8), &cfg()).unwrap();
        let bad = CsdConfig { lambda2: 2.0, ..cfg() };
        assert!(matches!(
            compute_current_source_density_inplace(&mut out, &bad),
            Err(CsdError::AlreadyApplied)
        ));
    }

    #[test]
    fn copy_flag_selects_target() {
        let mut r = raw(8, 8);
        let orig = r.clone();
        let copied = apply_current_source_density(&mut r, &cfg()).unwrap().into_owned();
        assert_eq!(r, orig);
        let in_place = CsdConfig { copy: false, ..cfg() };
        {
            let result = apply_current_source_density(&mut r, &in_place).unwrap();
            assert!(matches!(result, Csd::InPlace(_)));
            assert_eq!(*result, copied);
        }
        assert_eq!(r, copied);
    }

    #[test]
    fn failed_inplace_call_leaves_input_untouched() {
        let mut r = raw(8, 8);
        r.info.chs[3].loc[..3].copy_from_slice(&[f64::INFINITY; 3]);
        let before = r.clone();
        let err = compute_current_source_density_inplace(&mut r, &CsdConfig { copy: false, ..cfg() });
        assert!(matches!(err, Err(CsdError::Geometry(_))));
        assert_eq!(r, before);
    }

    #[test]
    fn epochs_and_evoked_agree_by_linearity() {
        let r = raw(12, 40);
        let data = Array3::from_shape_fn((5, 13, 8), |(e, c, t)| r.data[[c, e * 8 + t]]);
        let epochs = Epochs::new(r.info.clone(), data, -0.1).unwrap();
        let evoked = epochs.average().unwrap();

        let csd_epochs = compute_current_source_density(&epochs, &cfg()).unwrap();
        let csd_evoked = compute_current_source_density(&evoked, &cfg()).unwrap();
        let mean = csd_epochs.data.mean_axis(Axis(0)).unwrap();
        let scale = mean.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        for (a, b) in mean.iter().zip(csd_evoked.data.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-9 * scale);
        }
        assert_eq!(csd_epochs.n_epochs(), 5);
    }

    #[test]
    fn parallel_trials_match_single_blocks() {
        let r = raw(10, 24);
        let data = Array3::from_shape_fn((3, 11, 8), |(e, c, t)| r.data[[c, e * 8 + t]]);
        let epochs = Epochs::new(r.info.clone(), data, 0.0).unwrap();
        let csd_epochs = compute_current_source_density(&epochs, &cfg()).unwrap();
        for e in 0..3 {
            let block = epochs.data.index_axis(Axis(0), e).to_owned();
            let ev = compute_current_source_density(&Evoked::new(r.info.clone(), block, 0.0).unwrap(), &cfg()).unwrap();
            assert_eq!(csd_epochs.data.index_axis(Axis(0), e), ev.data);
        }
    }

    #[test]
    fn cache_shared_across_recordings() {
        let mut cache = KernelCache::new();
        let mut a = raw(10, 16);
        let mut b = raw(10, 32);
        compute_current_source_density_cached(&mut a, &cfg(), &mut cache).unwrap();
        compute_current_source_density_cached(&mut b, &cfg(), &mut cache).unwrap();
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn auto_sphere_close_to_fixed() {
        let r = raw(24, 16);
        let auto = compute_current_source_density(&r, &CsdConfig::default()).unwrap();
        let fixed = compute_current_source_density(&r, &cfg()).unwrap();
        let scale = fixed.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        for (a, b) in auto.data.iter().zip(fixed.data.iter()) {
            approx::assert_abs_diff_eq!(*a, *b, epsilon = 1e-4 * scale);
        }
    }
}
