//! Measurement info (MNE's `Info` struct), restricted to the CSD transform.
//!
//! Only fields the transform reads or must leave untouched are modelled;
//! MEG-specific fields (projections, CTF compensations, HPI, …) are omitted.
use std::fmt;

use super::constants::*;

// ── Channel info ─────────────────────────────────────────────────────────

/// One channel descriptor, the in-memory counterpart of a
/// `FIFFT_CH_INFO_STRUCT` tag.
///
/// `loc` follows the FIFF layout: `[x, y, z, nx0, ny0, nz0, …]`. For EEG
/// channels the first three entries are the electrode position and the
/// remaining nine are reference-electrode / orientation data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub scan_no:   i32,
    pub log_no:    i32,
    pub kind:      i32,
    pub range:     f32,
    pub cal:       f32,
    pub coil_type: i32,
    pub loc:       [f64; 12],
    pub unit:      i32,
    pub unit_mul:  i32,
    pub name:      String,
}

impl ChannelInfo {
    /// Build a channel descriptor with unit calibration and zeroed `loc`.
    pub fn new(name: &str, kind: i32, coil_type: i32, unit: i32) -> Self {
        Self {
            scan_no: 0,
            log_no: 0,
            kind,
            range: 1.0,
            cal: 1.0,
            coil_type,
            loc: [0.0; 12],
            unit,
            unit_mul: FIFF_UNITM_NONE,
            name: name.to_string(),
        }
    }

    /// Scalp EEG electrode at `pos` (recorded in volts).
    pub fn eeg(name: &str, pos: [f64; 3]) -> Self {
        let mut ch = Self::new(name, FIFFV_EEG_CH, FIFFV_COIL_EEG, FIFF_UNIT_V);
        ch.loc[..3].copy_from_slice(&pos);
        ch
    }

    /// Stimulus / trigger channel.
    pub fn stim(name: &str) -> Self {
        Self::new(name, FIFFV_STIM_CH, FIFFV_COIL_NONE, FIFF_UNIT_NONE)
    }

    /// Vectorview magnetometer.
    pub fn mag(name: &str) -> Self {
        Self::new(name, FIFFV_MEG_CH, FIFFV_COIL_VV_MAG_T3, FIFF_UNIT_T)
    }

    /// Electro-oculogram channel.
    pub fn eog(name: &str) -> Self {
        Self::new(name, FIFFV_EOG_CH, FIFFV_COIL_NONE, FIFF_UNIT_V)
    }

    /// Sensor position `loc[0..3]`.
    #[inline]
    pub fn pos(&self) -> [f64; 3] {
        [self.loc[0], self.loc[1], self.loc[2]]
    }

    /// Channel type label, derived the way MNE's `channel_type` does.
    pub fn channel_type(&self) -> ChannelType {
        match self.kind {
            FIFFV_MEG_CH if self.unit == FIFF_UNIT_T_M => ChannelType::Grad,
            FIFFV_MEG_CH => ChannelType::Mag,
            FIFFV_REF_MEG_CH => ChannelType::RefMeg,
            FIFFV_EEG_CH if self.coil_type == FIFFV_COIL_EEG_CSD => ChannelType::Csd,
            FIFFV_EEG_CH => ChannelType::Eeg,
            FIFFV_STIM_CH => ChannelType::Stim,
            FIFFV_EOG_CH => ChannelType::Eog,
            FIFFV_EMG_CH => ChannelType::Emg,
            FIFFV_ECG_CH => ChannelType::Ecg,
            FIFFV_MISC_CH => ChannelType::Misc,
            FIFFV_SEEG_CH => ChannelType::Seeg,
            FIFFV_ECOG_CH => ChannelType::Ecog,
            other => ChannelType::Other(other),
        }
    }
}

/// Channel type label as reported by MNE (`'eeg'`, `'csd'`, `'mag'`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Mag,
    Grad,
    RefMeg,
    Eeg,
    Csd,
    Stim,
    Eog,
    Emg,
    Ecg,
    Misc,
    Seeg,
    Ecog,
    Other(i32),
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelType::Mag => "mag",
            ChannelType::Grad => "grad",
            ChannelType::RefMeg => "ref_meg",
            ChannelType::Eeg => "eeg",
            ChannelType::Csd => "csd",
            ChannelType::Stim => "stim",
            ChannelType::Eog => "eog",
            ChannelType::Emg => "emg",
            ChannelType::Ecg => "ecg",
            ChannelType::Misc => "misc",
            ChannelType::Seeg => "seeg",
            ChannelType::Ecog => "ecog",
            ChannelType::Other(kind) => return write!(f, "kind{kind}"),
        };
        f.write_str(s)
    }
}

// ── Measurement info ─────────────────────────────────────────────────────

/// Measurement metadata shared by raw, epoched and evoked containers.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasInfo {
    pub n_chan:     usize,
    pub sfreq:     f64,
    pub lowpass:   Option<f64>,
    pub highpass:  Option<f64>,
    pub line_freq: Option<f64>,
    pub chs:       Vec<ChannelInfo>,
    pub bad_ch_names: Vec<String>,
    pub experimenter: Option<String>,
    pub description:  Option<String>,
    /// One of `FIFFV_MNE_CUSTOM_REF_{OFF, ON, CSD}`.
    pub custom_ref_applied: i32,
}

impl MeasInfo {
    pub fn new(chs: Vec<ChannelInfo>, sfreq: f64) -> Self {
        Self {
            n_chan: chs.len(),
            sfreq,
            lowpass: None,
            highpass: None,
            line_freq: None,
            chs,
            bad_ch_names: vec![],
            experimenter: None,
            description: None,
            custom_ref_applied: FIFFV_MNE_CUSTOM_REF_OFF,
        }
    }

    pub fn channel_type(&self, idx: usize) -> ChannelType {
        self.chs[idx].channel_type()
    }

    /// Indices of channels of type `ty`, bads included.
    pub fn pick_type(&self, ty: ChannelType) -> Vec<usize> {
        (0..self.chs.len()).filter(|&i| self.channel_type(i) == ty).collect()
    }

    /// Indices of scalp-potential EEG channels, bads included.
    ///
    /// Equivalent to `pick_types(info, meg=False, eeg=True, exclude=[])`;
    /// channels already carrying CSD are not EEG.
    pub fn pick_eeg(&self) -> Vec<usize> {
        self.pick_type(ChannelType::Eeg)
    }

    /// Names in `bad_ch_names` that refer to one of `picks`.
    pub fn bads_among(&self, picks: &[usize]) -> Vec<&str> {
        picks
            .iter()
            .map(|&i| self.chs[i].name.as_str())
            .filter(|name| self.bad_ch_names.iter().any(|b| b == name))
            .collect()
    }

    /// Whether the CSD transform has already been applied.
    pub fn csd_applied(&self) -> bool {
        self.custom_ref_applied == FIFFV_MNE_CUSTOM_REF_CSD
    }
}
