//! In-memory recording containers: continuous [`Raw`], trial-epoched
//! [`Epochs`] and averaged [`Evoked`].
//!
//! Each pairs a [`MeasInfo`] with a sample array in volts. The CSD
//! transform reaches them through [`CsdTarget`], which exposes the samples
//! either as one `[C, T]` block or as `[E, C, T]` trials.
use std::any::Any;

use ndarray::{Array2, Array3, ArrayViewMut2, ArrayViewMut3, Axis};

use crate::error::{CsdError, Result};
use crate::fiff::{ChannelType, MeasInfo};

/// Mutable view of a container's samples.
pub enum SampleBlocks<'a> {
    /// `[C, T]`: continuous or averaged data.
    Single(ArrayViewMut2<'a, f64>),
    /// `[E, C, T]`: one block per trial.
    Trials(ArrayViewMut3<'a, f64>),
}

/// A container the CSD transform can be applied to.
pub trait CsdTarget {
    /// Human-readable container kind, used in log messages.
    const KIND: &'static str;

    fn info(&self) -> &MeasInfo;
    fn info_mut(&mut self) -> &mut MeasInfo;
    fn blocks_mut(&mut self) -> SampleBlocks<'_>;

    /// Length of the channel axis of the sample array.
    fn n_channel_rows(&self) -> usize;

    /// [`CsdError::Shape`] unless `info` describes exactly the channel rows
    /// of the samples.
    fn check_shape(&self) -> Result<()> {
        check_channels(self.info(), self.n_channel_rows(), Self::KIND)
    }
}

fn check_channels(info: &MeasInfo, n_rows: usize, what: &str) -> Result<()> {
    if info.chs.len() != n_rows || info.n_chan != n_rows {
        return Err(CsdError::Shape(format!(
            "{what} has {n_rows} channels but info describes {} (n_chan = {})",
            info.chs.len(),
            info.n_chan
        )));
    }
    Ok(())
}

// ── Raw ──────────────────────────────────────────────────────────────────

/// Continuous recording, `data`: `[C, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub info: MeasInfo,
    pub data: Array2<f64>,
    /// Index of the first sample in acquisition time.
    pub first_samp: usize,
}

impl Raw {
    pub fn new(info: MeasInfo, data: Array2<f64>) -> Result<Self> {
        check_channels(&info, data.nrows(), "raw data")?;
        Ok(Self { info, data, first_samp: 0 })
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Rows of all channels of type `ty`, `[n_picked, T]`.
    pub fn get_data(&self, ty: ChannelType) -> Array2<f64> {
        self.data.select(Axis(0), &self.info.pick_type(ty))
    }
}

impl CsdTarget for Raw {
    const KIND: &'static str = "Raw";

    fn info(&self) -> &MeasInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MeasInfo {
        &mut self.info
    }

    fn blocks_mut(&mut self) -> SampleBlocks<'_> {
        SampleBlocks::Single(self.data.view_mut())
    }

    fn n_channel_rows(&self) -> usize {
        self.data.nrows()
    }
}

// ── Epochs ───────────────────────────────────────────────────────────────

/// Trial-epoched recording, `data`: `[E, C, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Epochs {
    pub info: MeasInfo,
    pub data: Array3<f64>,
    /// Time of the first sample of each trial relative to the event (s).
    pub tmin: f64,
    /// Event code per trial.
    pub event_ids: Vec<i32>,
}

impl Epochs {
    /// Trials all get event code 1.
    pub fn new(info: MeasInfo, data: Array3<f64>, tmin: f64) -> Result<Self> {
        check_channels(&info, data.shape()[1], "epochs data")?;
        let event_ids = vec![1; data.shape()[0]];
        Ok(Self { info, data, tmin, event_ids })
    }

    pub fn n_epochs(&self) -> usize {
        self.data.shape()[0]
    }

    /// Average over trials.
    pub fn average(&self) -> Result<Evoked> {
        let data = self
            .data
            .mean_axis(Axis(0))
            .ok_or_else(|| CsdError::Shape("cannot average zero epochs".into()))?;
        let mut evoked = Evoked::new(self.info.clone(), data, self.tmin)?;
        evoked.nave = self.n_epochs();
        Ok(evoked)
    }

    /// Trials of all channels of type `ty`, `[E, n_picked, T]`.
    pub fn get_data(&self, ty: ChannelType) -> Array3<f64> {
        self.data.select(Axis(1), &self.info.pick_type(ty))
    }
}

impl CsdTarget for Epochs {
    const KIND: &'static str = "Epochs";

    fn info(&self) -> &MeasInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MeasInfo {
        &mut self.info
    }

    fn blocks_mut(&mut self) -> SampleBlocks<'_> {
        SampleBlocks::Trials(self.data.view_mut())
    }

    fn n_channel_rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }
}

// ── Evoked ───────────────────────────────────────────────────────────────

/// Averaged response, `data`: `[C, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Evoked {
    pub info: MeasInfo,
    pub data: Array2<f64>,
    pub tmin: f64,
    /// Number of averaged trials.
    pub nave: usize,
    pub comment: Option<String>,
}

impl Evoked {
    pub fn new(info: MeasInfo, data: Array2<f64>, tmin: f64) -> Result<Self> {
        check_channels(&info, data.nrows(), "evoked data")?;
        Ok(Self { info, data, tmin, nave: 1, comment: None })
    }

    pub fn get_data(&self, ty: ChannelType) -> Array2<f64> {
        self.data.select(Axis(0), &self.info.pick_type(ty))
    }
}

impl CsdTarget for Evoked {
    const KIND: &'static str = "Evoked";

    fn info(&self) -> &MeasInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MeasInfo {
        &mut self.info
    }

    fn blocks_mut(&mut self) -> SampleBlocks<'_> {
        SampleBlocks::Single(self.data.view_mut())
    }

    fn n_channel_rows(&self) -> usize {
        self.data.nrows()
    }
}

// ── Recording ────────────────────────────────────────────────────────────

/// Any one of the three recognised container kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Recording {
    Raw(Raw),
    Epochs(Epochs),
    Evoked(Evoked),
}

impl Recording {
    /// Accept a dynamically typed value if it is a recognised container.
    ///
    /// Anything else is a [`CsdError::TypeConstraint`] naming the accepted
    /// kinds.
    pub fn from_any(value: Box<dyn Any>) -> Result<Self> {
        let value = match value.downcast::<Recording>() {
            Ok(rec) => return Ok(*rec),
            Err(v) => v,
        };
        let value = match value.downcast::<Raw>() {
            Ok(raw) => return Ok(Recording::Raw(*raw)),
            Err(v) => v,
        };
        let value = match value.downcast::<Epochs>() {
            Ok(epochs) => return Ok(Recording::Epochs(*epochs)),
            Err(v) => v,
        };
        match value.downcast::<Evoked>() {
            Ok(evoked) => Ok(Recording::Evoked(*evoked)),
            Err(_) => Err(CsdError::type_constraint(
                "inst",
                "Raw, Epochs, or Evoked",
                "an unsupported type",
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Recording::Raw(_) => Raw::KIND,
            Recording::Epochs(_) => Epochs::KIND,
            Recording::Evoked(_) => Evoked::KIND,
        }
    }
}

impl From<Raw> for Recording {
    fn from(raw: Raw) -> Self {
        Recording::Raw(raw)
    }
}

impl From<Epochs> for Recording {
    fn from(epochs: Epochs) -> Self {
        Recording::Epochs(epochs)
    }
}

impl From<Evoked> for Recording {
    fn from(evoked: Evoked) -> Self {
        Recording::Evoked(evoked)
    }
}

impl CsdTarget for Recording {
    const KIND: &'static str = "Recording";

    fn info(&self) -> &MeasInfo {
        match self {
            Recording::Raw(r) => r.info(),
            Recording::Epochs(e) => e.info(),
            Recording::Evoked(e) => e.info(),
        }
    }

    fn info_mut(&mut self) -> &mut MeasInfo {
        match self {
            Recording::Raw(r) => r.info_mut(),
            Recording::Epochs(e) => e.info_mut(),
            Recording::Evoked(e) => e.info_mut(),
        }
    }

    fn blocks_mut(&mut self) -> SampleBlocks<'_> {
        match self {
            Recording::Raw(r) => r.blocks_mut(),
            Recording::Epochs(e) => e.blocks_mut(),
            Recording::Evoked(e) => e.blocks_mut(),
        }
    }

    fn n_channel_rows(&self) -> usize {
        match self {
            Recording::Raw(r) => r.n_channel_rows(),
            Recording::Epochs(e) => e.n_channel_rows(),
            Recording::Evoked(e) => e.n_channel_rows(),
        }
    }
}
