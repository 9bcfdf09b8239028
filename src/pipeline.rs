//! Frame to temperatures, end to end.
use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use ndarray::Array2;
use serde_derive::*;
use tracing::{debug, warn};

use crate::{
    calibration::SensorMode,
    environment::EnvironmentParameters,
    error::Result,
    frame::RawFrame,
    lut::{CalibrationContext, TemperatureLut},
    metadata::FrameMetadata,
    summary::FrameSummary,
};

/// Collaborator-owned configuration read by every frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub sensor_mode: SensorMode,
    /// Use the environment stored by the device. When false,
    /// [`environment`][Self::environment] is used instead.
    pub read_params_from_device: bool,
    pub environment: EnvironmentParameters,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sensor_mode: SensorMode::default(),
            read_params_from_device: true,
            environment: EnvironmentParameters::default(),
        }
    }
}

impl Settings {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening settings {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing settings {}", path.display()))
    }

    /// The environment in effect for a frame.
    pub fn environment_for(&self, meta: &FrameMetadata) -> EnvironmentParameters {
        if self.read_params_from_device {
            meta.environment
        } else {
            self.environment
        }
    }
}

/// The results for one frame.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub metadata: FrameMetadata,
    /// The environment the LUT was built with.
    pub environment: EnvironmentParameters,
    pub context: CalibrationContext,
    pub lut: TemperatureLut,
    pub summary: FrameSummary,
}

impl ProcessedFrame {
    /// Temperatures of the image area of `frame`.
    pub fn temperatures(&self, frame: &RawFrame) -> Array2<f64> {
        self.lut.apply(frame.image())
    }
}

/// Decode `frame`, build its LUT and summary.
///
/// Fails only if the trailer cannot be decoded. Codes
/// outside the calibration domain show up as `NaN` entries.
pub fn process_frame(frame: &RawFrame, settings: &Settings) -> Result<ProcessedFrame> {
    let metadata = FrameMetadata::from_frame(frame)?;
    let environment = settings.environment_for(&metadata);
    let context = CalibrationContext::from_metadata(&metadata, &environment, settings.sensor_mode);
    let lut = TemperatureLut::build(&context);
    let summary = FrameSummary::extract(&lut, &metadata.stats, frame.geometry());

    let invalid = lut.domain_errors().count();
    if invalid > 0 {
        debug!(invalid, "LUT entries outside the calibration domain");
    }
    for e in summary.errors() {
        warn!("{}", e);
    }

    Ok(ProcessedFrame {
        metadata,
        environment,
        context,
        lut,
        summary,
    })
}

/// Processes a stream of frames, keeping the last frame
/// that decoded.
#[derive(Debug, Default)]
pub struct FrameProcessor {
    settings: Settings,
    latest: Option<ProcessedFrame>,
}

impl FrameProcessor {
    pub fn new(settings: Settings) -> Self {
        FrameProcessor {
            settings,
            latest: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Process `frame`. On failure the previous result is
    /// kept and still available from [`latest`][Self::latest].
    pub fn push(&mut self, frame: &RawFrame) -> Result<&ProcessedFrame> {
        match process_frame(frame, &self.settings) {
            Ok(processed) => Ok(&*self.latest.insert(processed)),
            Err(e) => {
                warn!("skipping frame: {}", e);
                Err(e)
            }
        }
    }

    pub fn latest(&self) -> Option<&ProcessedFrame> {
        self.latest.as_ref()
    }
}
