//! Per-frame calibration curves.
//!
//! The device stores five constants `a0..a4` describing two
//! quadratics:
//!
//! - `curve_a(core) = a0 * core^2 + a1 * core`, evaluated at
//!   the raw core temperature code;
//! - `curve_b(fpa) = a2 * fpa^2 + a3 * fpa + a4`, evaluated
//!   at the focal-plane array temperature in celsius.
//!
//! Each curve is evaluated in its own unit, as the device
//! firmware does.
use serde_derive::*;
use tracing::trace;

use crate::ABSOLUTE_ZERO_CELSIUS;

declare_parseable_struct! {
    /// The five calibration constants stored in the device
    /// block of the trailer.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
    pub struct CalibrationConstants {
        pub a0 => f32 as f64,
        pub a1 => f32 as f64,
        pub a2 => f32 as f64,
        pub a3 => f32 as f64,
        pub a4 => f32 as f64,
    }
}

impl CalibrationConstants {
    pub fn curve_a(&self, core: f64) -> f64 {
        self.a0 * core * core + self.a1 * core
    }

    pub fn curve_b(&self, fpa: f64) -> f64 {
        self.a2 * fpa * fpa + self.a3 * fpa + self.a4
    }
}

/// Sensor temperatures decoded from the trailer.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct DerivedReadings {
    /// Raw core temperature code, in tenths of a kelvin.
    pub core_raw: u16,
    pub core_temp: f64,
    /// Raw focal-plane array reading.
    pub fpa_raw: u16,
    pub fpa_temp: f64,
}

impl DerivedReadings {
    pub fn from_raw(core_raw: u16, fpa_raw: u16) -> Self {
        DerivedReadings {
            core_raw,
            core_temp: f64::from(core_raw) / 10. + ABSOLUTE_ZERO_CELSIUS,
            fpa_raw,
            fpa_temp: 20. - (f64::from(fpa_raw) - 7800.) / 36.,
        }
    }
}

/// Temperature range the sensor is operating in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    /// Up to about 120 °C.
    Low,
    /// Up to about 400 °C.
    High,
}

impl Default for SensorMode {
    fn default() -> Self {
        SensorMode::Low
    }
}

impl SensorMode {
    /// Shift applied to the raw-code domain before the LUT
    /// is built.
    pub fn index_shift(&self, fpa_temp: f64) -> i64 {
        match self {
            SensorMode::Low => (390.0 - fpa_temp * 7.05).floor() as i64,
            SensorMode::High => 0,
        }
    }
}

/// The calibration curves evaluated for one frame.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct CalibrationCurve {
    /// Leading coefficient `a0`, divides the radiance term.
    pub a0: f64,
    pub curve_a: f64,
    pub curve_b: f64,
    /// `a1 / (2 * a0)`
    pub half_b_over_a: f64,
    pub half_b_over_a_sq: f64,
    /// `v2`, see [`SensorMode::index_shift`].
    pub index_shift: i64,
}

impl CalibrationCurve {
    pub fn solve(
        constants: &CalibrationConstants,
        readings: &DerivedReadings,
        mode: SensorMode,
    ) -> Self {
        let half_b_over_a = constants.a1 / (2. * constants.a0);
        let curve = CalibrationCurve {
            a0: constants.a0,
            curve_a: constants.curve_a(f64::from(readings.core_raw)),
            curve_b: constants.curve_b(readings.fpa_temp),
            half_b_over_a,
            half_b_over_a_sq: half_b_over_a * half_b_over_a,
            index_shift: mode.index_shift(readings.fpa_temp),
        };
        trace!(?curve, "solved calibration curve");
        curve
    }

    /// The value under the square root for raw code `code`.
    ///
    /// Codes are addressed from the shifted origin
    /// downwards: `index_shift - code`.
    pub fn apparent_radiance(&self, code: u16) -> f64 {
        let shifted = (self.index_shift - i64::from(code)) as f64;
        (shifted * self.curve_b + self.curve_a) / self.a0 + self.half_b_over_a_sq
    }

    /// Apparent temperature in kelvin for `code`, `NaN` when
    /// the radiance is negative.
    pub fn apparent_temperature(&self, code: u16) -> f64 {
        let radiance = self.apparent_radiance(code);
        if radiance < 0. {
            return f64::NAN;
        }
        radiance.sqrt() - self.half_b_over_a - ABSOLUTE_ZERO_CELSIUS
    }
}
