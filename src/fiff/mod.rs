//! FIFF-style channel metadata.
//!
//! Mirrors the parts of MNE-Python's `Info` that the CSD transform reads and
//! writes: per-channel kind, coil type, unit and location, the bad-channel
//! list and the custom-reference state. Reading `.fif` files is left to the
//! surrounding application.
//!
//! # Quick start
//! ```
//! use exg_csd::fiff::{ChannelInfo, ChannelType, MeasInfo};
//!
//! let chs = vec![
//!     ChannelInfo::eeg("Cz", [0.0, 0.0, 0.09]),
//!     ChannelInfo::stim("STI 014"),
//! ];
//! let info = MeasInfo::new(chs, 256.0);
//! assert_eq!(info.channel_type(0), ChannelType::Eeg);
//! assert_eq!(info.pick_eeg(), vec![0]);
//! ```
pub mod constants;
pub mod info;

pub use info::{ChannelInfo, ChannelType, MeasInfo};
