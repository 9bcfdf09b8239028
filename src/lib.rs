//! Library to compute temperatures from HT301 thermal
//! camera frames.
//!
//! The camera appends four metadata rows to every captured
//! frame. They carry the device calibration constants, the
//! ambient parameters and the live sensor temperatures,
//! along with a few per-frame statistics. This crate
//! provides:
//!
//! 1. [Decoding](metadata::FrameMetadata) of the trailer rows.
//!
//! 2. Building a [temperature lookup
//! table](lut::TemperatureLut) from the decoded values: one
//! celsius value for each of the 16384 raw codes, corrected
//! for atmospheric transmission, emissivity and reflected
//! radiance. See [`environment`] and [`calibration`].
//!
//! 3. [Reading](summary::FrameSummary) the center, hottest
//! and coldest pixel temperatures reported by the camera.
//!
//! # Usage
//!
//! ```rust
//! # fn test_compile(bytes: &[u8]) -> anyhow::Result<()> {
//! use ht301::{process_frame, FrameGeometry, RawFrame, Settings};
//!
//! let frame = RawFrame::from_le_bytes(bytes, FrameGeometry::HT301)?;
//! let processed = process_frame(&frame, &Settings::default())?;
//! println!("center: {:.1}C", processed.summary.center.temperature);
//!
//! let temperatures = processed.temperatures(&frame);
//! # Ok(())
//! # }
//! ```
//!
//! Building a table is a pure function of a
//! [`CalibrationContext`], so frames can be processed on
//! separate threads without sharing any state.

#[macro_use]
mod parse;

pub mod calibration;
pub mod environment;
pub mod error;
pub mod frame;
pub mod lut;
pub mod metadata;
pub mod pipeline;
pub mod summary;

#[cfg(feature = "cli")]
pub mod cli;

/// Absolute zero in celsius.
pub const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

pub use crate::error::{Error, Result};
pub use crate::frame::{FrameGeometry, RawFrame};
pub use crate::lut::{CalibrationContext, TemperatureLut, LUT_SIZE};
pub use crate::metadata::FrameMetadata;
pub use crate::pipeline::{process_frame, FrameProcessor, ProcessedFrame, Settings};
pub use crate::summary::FrameSummary;
