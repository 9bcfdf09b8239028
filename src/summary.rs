//! Scalar readings of a frame: center, hottest and coldest
//! pixel, and the three probe points.
use std::iter::once;

use serde_derive::*;

use crate::{error::Error, frame::FrameGeometry, lut::TemperatureLut, metadata::FrameStats};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

/// A raw code read from the trailer and its temperature.
///
/// A code past the LUT yields a `NaN` temperature and the
/// corresponding [`Error::IndexOutOfRange`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SpotReading {
    pub point: Option<Point>,
    pub raw: u16,
    pub temperature: f64,
    #[serde(skip)]
    pub error: Option<Error>,
}

impl SpotReading {
    fn read(lut: &TemperatureLut, field: &'static str, raw: u16, point: Option<Point>) -> Self {
        let (temperature, error) = match lut.get(field, raw as usize) {
            Ok(t) => (t, None),
            Err(e) => (f64::NAN, Some(e)),
        };
        SpotReading {
            point,
            raw,
            temperature,
            error,
        }
    }
}

/// Temperatures reported for a frame.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub center: SpotReading,
    pub max: SpotReading,
    pub min: SpotReading,
    pub probes: [SpotReading; 3],
}

impl FrameSummary {
    pub fn extract(lut: &TemperatureLut, stats: &FrameStats, geometry: FrameGeometry) -> Self {
        let center = Point {
            x: geometry.width / 2,
            y: geometry.height / 2,
        };
        let max = Point {
            x: stats.max_x as usize,
            y: stats.max_y as usize,
        };
        let min = Point {
            x: stats.min_x as usize,
            y: stats.min_y as usize,
        };
        let [p0, p1, p2] = stats.probe_raw;

        FrameSummary {
            center: SpotReading::read(lut, "center", stats.center_raw, Some(center)),
            max: SpotReading::read(lut, "max", stats.max_raw, Some(max)),
            min: SpotReading::read(lut, "min", stats.min_raw, Some(min)),
            probes: [
                SpotReading::read(lut, "probe 0", p0, None),
                SpotReading::read(lut, "probe 1", p1, None),
                SpotReading::read(lut, "probe 2", p2, None),
            ],
        }
    }

    /// Every reading, center first.
    pub fn spots(&self) -> impl Iterator<Item = &SpotReading> + '_ {
        once(&self.center)
            .chain(once(&self.max))
            .chain(once(&self.min))
            .chain(self.probes.iter())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> + '_ {
        self.spots().filter_map(|s| s.error.as_ref())
    }
}
