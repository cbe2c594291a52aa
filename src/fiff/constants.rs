//! FIFF constants used by channel metadata.
//!
//! Names mirror [`mne/_fiff/constants.py`][mne-src] so that channel
//! descriptors can be cross-referenced with MNE's `info['chs']` entries.
//! Only the subset that the CSD transform reads or writes is defined here.
//!
//! [mne-src]: https://github.com/mne-tools/mne-python/blob/main/mne/_fiff/constants.py

#![allow(dead_code)]

// ── Channel kind codes (`ChannelInfo::kind`) ──────────────────────────────

/// MEG magnetometer or gradiometer channel.
pub const FIFFV_MEG_CH:     i32 = 1;
/// EEG scalp-potential channel (also used for CSD-transformed channels).
pub const FIFFV_EEG_CH:     i32 = 2;
/// Stimulus / trigger channel.
pub const FIFFV_STIM_CH:    i32 = 3;
/// Electro-oculogram channel.
pub const FIFFV_EOG_CH:     i32 = 202;
/// MEG reference (compensation) channel.
pub const FIFFV_REF_MEG_CH: i32 = 301;
/// Electromyogram channel.
pub const FIFFV_EMG_CH:     i32 = 302;
/// Electrocardiogram channel.
pub const FIFFV_ECG_CH:     i32 = 402;
/// Miscellaneous auxiliary channel.
pub const FIFFV_MISC_CH:    i32 = 502;
/// Stereo-EEG depth electrode channel.
pub const FIFFV_SEEG_CH:    i32 = 802;
/// Electrocorticography (ECoG) channel.
pub const FIFFV_ECOG_CH:    i32 = 902;

// ── Coil types (`ChannelInfo::coil_type`) ─────────────────────────────────

/// No coil (non-MEG, non-EEG channels).
pub const FIFFV_COIL_NONE:        i32 = 0;
/// Scalp EEG electrode, potential in volts.
pub const FIFFV_COIL_EEG:         i32 = 1;
/// EEG electrode carrying a current-source-density (surface Laplacian) estimate.
pub const FIFFV_COIL_EEG_CSD:     i32 = 5;
/// Vectorview planar gradiometer (T1).
pub const FIFFV_COIL_VV_PLANAR_T1: i32 = 3012;
/// Vectorview magnetometer (T3).
pub const FIFFV_COIL_VV_MAG_T3:   i32 = 3024;

// ── Units (`ChannelInfo::unit`) ───────────────────────────────────────────

/// No unit.
pub const FIFF_UNIT_NONE:  i32 = -1;
/// Unitless quantity.
pub const FIFF_UNIT_UNITLESS: i32 = 0;
/// Volt.
pub const FIFF_UNIT_V:     i32 = 107;
/// Tesla.
pub const FIFF_UNIT_T:     i32 = 112;
/// Tesla per metre (planar gradiometers).
pub const FIFF_UNIT_T_M:   i32 = 201;
/// Volt per square metre, the surface Laplacian of a potential.
pub const FIFF_UNIT_V_M2:  i32 = 213;

/// Unit multiplier: none (10⁰).
pub const FIFF_UNITM_NONE: i32 = 0;

// ── Custom reference state (`MeasInfo::custom_ref_applied`) ───────────────

/// No custom reference: data are in their recorded reference.
pub const FIFFV_MNE_CUSTOM_REF_OFF: i32 = 0;
/// A custom (e.g. average) EEG reference has been applied.
pub const FIFFV_MNE_CUSTOM_REF_ON:  i32 = 1;
/// The CSD transform has been applied; the data are reference-free.
pub const FIFFV_MNE_CUSTOM_REF_CSD: i32 = 2;
