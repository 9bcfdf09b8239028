//! Temperature lookup tables.
//!
//! A [`TemperatureLut`] maps every raw code `0..16384` to a
//! temperature in celsius for one frame. It is built from a
//! [`CalibrationContext`], which bundles everything the
//! conversion depends on so that building a table is a pure
//! function of its input.
use std::ops::Index;

use ndarray::{Array2, ArrayView2, Zip};
use rayon::prelude::*;
use serde_derive::*;

use crate::{
    calibration::{CalibrationConstants, CalibrationCurve, DerivedReadings, SensorMode},
    environment::{distance_bias, AtmosphericCorrection, EnvironmentParameters},
    error::{Error, Result},
    metadata::FrameMetadata,
};

/// Number of raw codes the sensor can report.
pub const LUT_SIZE: usize = 16384;

/// Immutable inputs to a LUT build.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct CalibrationContext {
    pub curve: CalibrationCurve,
    pub atmosphere: AtmosphericCorrection,
    pub air_temp: f64,
    /// See [`distance_bias`].
    pub distance_bias: f64,
}

impl CalibrationContext {
    pub fn new(curve: CalibrationCurve, env: &EnvironmentParameters) -> Self {
        CalibrationContext {
            curve,
            atmosphere: AtmosphericCorrection::compute(env),
            air_temp: env.air_temp,
            distance_bias: distance_bias(env.object_distance()),
        }
    }

    /// Context for a frame, using `env` in place of the
    /// environment stored in the trailer.
    pub fn from_metadata(meta: &FrameMetadata, env: &EnvironmentParameters, mode: SensorMode) -> Self {
        Self::from_readings(&meta.device.calibration, &meta.readings, env, mode)
    }

    pub fn from_readings(
        constants: &CalibrationConstants,
        readings: &DerivedReadings,
        env: &EnvironmentParameters,
        mode: SensorMode,
    ) -> Self {
        Self::new(CalibrationCurve::solve(constants, readings, mode), env)
    }

    /// Temperature for one raw code; `NaN` if the code is
    /// outside the calibration domain.
    pub fn temperature(&self, code: u16) -> f64 {
        let apparent = self.curve.apparent_temperature(code);
        let object = self.atmosphere.object_temperature(apparent);
        object + self.distance_bias * (object - self.air_temp)
    }

    pub fn checked_temperature(&self, code: u16) -> Result<f64> {
        let temp = self.temperature(code);
        if temp.is_nan() {
            Err(Error::CalibrationDomain { code })
        } else {
            Ok(temp)
        }
    }
}

/// Temperatures in celsius, indexed by raw code.
///
/// Entries outside the calibration domain are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureLut {
    values: Vec<f64>,
}

impl TemperatureLut {
    pub fn build(ctx: &CalibrationContext) -> Self {
        let values = (0..LUT_SIZE as u16).map(|code| ctx.temperature(code)).collect();
        TemperatureLut { values }
    }

    /// Same as [`build`][Self::build], computed in parallel.
    /// Entries are independent so the output is identical.
    pub fn build_par(ctx: &CalibrationContext) -> Self {
        let values = (0..LUT_SIZE as u16)
            .into_par_iter()
            .map(|code| ctx.temperature(code))
            .collect();
        TemperatureLut { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Temperature for `code`, `NaN` if out of range.
    pub fn lookup(&self, code: u16) -> f64 {
        self.values.get(code as usize).copied().unwrap_or(f64::NAN)
    }

    /// Temperature for `code`, naming `field` in the error if
    /// the code is past the table.
    pub fn get(&self, field: &'static str, code: usize) -> Result<f64> {
        self.values
            .get(code)
            .copied()
            .ok_or(Error::IndexOutOfRange { field, code })
    }

    /// Codes whose entry is `NaN`.
    pub fn domain_errors(&self) -> impl Iterator<Item = Error> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_nan())
            .map(|(code, _)| Error::CalibrationDomain { code: code as u16 })
    }

    /// Convert an array of raw codes to temperatures.
    pub fn apply(&self, raw: ArrayView2<'_, u16>) -> Array2<f64> {
        Zip::from(raw).par_map_collect(|&code| self.lookup(code))
    }
}

impl Index<u16> for TemperatureLut {
    type Output = f64;

    fn index(&self, code: u16) -> &f64 {
        &self.values[code as usize]
    }
}
