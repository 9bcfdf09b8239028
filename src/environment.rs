//! Atmospheric correction.
//!
//! Transmission through the air follows Minkina and Dudzik,
//! the same model FLIR cameras use for their
//! `AtmosphericTrans*` parameters, with the HT301 constants.
//! See [mdpi sensors 17/8/1718][paper], page 4.
//!
//! [paper]: //www.mdpi.com/1424-8220/17/8/1718
use serde_derive::*;
use tracing::trace;

use crate::ABSOLUTE_ZERO_CELSIUS;

declare_parseable_struct! {
    /// Ambient parameters used to correct the measured
    /// radiance.
    ///
    /// The camera stores these in the device block of the
    /// trailer, in this field order. They can also be
    /// supplied externally (see
    /// [`Settings`][crate::pipeline::Settings]); numeric
    /// fields then accept strings with a unit suffix, eg.
    /// `"25.0 C"`, and a `%` suffix is read as a percentage.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
    #[serde(default)]
    pub struct EnvironmentParameters {
        /// Offset the device adds to reported temperatures.
        #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
        pub fix_offset => f32 as f64,
        #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
        pub reflected_temp => f32 as f64,
        #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
        pub air_temp => f32 as f64,
        /// Relative humidity as a fraction.
        #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
        pub humidity => f32 as f64,
        #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
        pub emissivity => f32 as f64,
        /// Object distance in meters.
        #[serde(deserialize_with = "serde_helpers::float_with_suffix")]
        pub distance => u16 as f64,
    }
}

impl Default for EnvironmentParameters {
    fn default() -> Self {
        EnvironmentParameters {
            fix_offset: 0.,
            reflected_temp: 25.,
            air_temp: 25.,
            humidity: 0.5,
            emissivity: 0.95,
            distance: 1.,
        }
    }
}

impl EnvironmentParameters {
    /// Object distance, negative values read as zero.
    pub fn object_distance(&self) -> f64 {
        self.distance.max(0.)
    }
}

// w = exp(h0 + h1 T + h2 T^2 + h3 T^3) * RH
const WATER_VAPOUR_SERIES: [f64; 4] = [1.5587, 0.06939, -0.00027816, 0.00000068455];

// tau = K exp(-sqrt(d) (a1 + b1 sqrt(w))) + (1 - K) exp(-sqrt(d) (a2 + b2 sqrt(w)))
const ATM_K: f64 = 1.9;
const ATM_ALPHA: [f64; 2] = [0.0066, 0.0126];
const ATM_BETA: [f64; 2] = [-0.0023, -0.0067];

/// Distance bias saturates at this many meters.
const DISTANCE_BIAS_CAP: f64 = 20.;

/// Terms that invert the apparent radiance into object
/// radiance.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct AtmosphericCorrection {
    /// Water vapour content coefficient.
    pub water_vapour: f64,
    /// Atmospheric transmittance `t`.
    pub transmittance: f64,
    /// `1 / (emissivity * t)`
    pub inverse_emittance: f64,
    /// Reflected plus atmospheric radiance, in kelvin^4:
    /// `(1 - e) t Trefl^4 + (1 - t) Tatm^4`.
    pub background_radiance: f64,
}

impl AtmosphericCorrection {
    pub fn compute(env: &EnvironmentParameters) -> Self {
        let water_vapour = power_series_at(&WATER_VAPOUR_SERIES, env.air_temp).exp() * env.humidity;
        let transmittance = transmittance(env.object_distance(), water_vapour);

        let emissivity = env.emissivity;
        let refl_k = env.reflected_temp - ABSOLUTE_ZERO_CELSIUS;
        let air_k = env.air_temp - ABSOLUTE_ZERO_CELSIUS;
        let background_radiance = (1. - emissivity) * transmittance * refl_k.powi(4)
            + (1. - transmittance) * air_k.powi(4);

        trace!(water_vapour, transmittance, "atmospheric correction");

        AtmosphericCorrection {
            water_vapour,
            transmittance,
            inverse_emittance: 1. / (emissivity * transmittance),
            background_radiance,
        }
    }

    /// Object temperature in celsius from an apparent
    /// temperature in kelvin. `NaN` when the corrected
    /// radiance is negative.
    pub fn object_temperature(&self, apparent_k: f64) -> f64 {
        let radiance = (apparent_k.powi(4) - self.background_radiance) * self.inverse_emittance;
        if radiance < 0. {
            return f64::NAN;
        }
        radiance.powf(0.25) + ABSOLUTE_ZERO_CELSIUS
    }
}

/// Transmittance through `distance` meters of air with
/// water vapour coefficient `water_vapour`.
pub fn transmittance(distance: f64, water_vapour: f64) -> f64 {
    let d = -distance.max(0.).sqrt();
    let w = water_vapour.sqrt();
    let damp = |i: usize| (d * (ATM_ALPHA[i] + ATM_BETA[i] * w)).exp();
    ATM_K * damp(0) + (1. - ATM_K) * damp(1)
}

/// Relative bias applied to object temperatures, as a
/// fraction of their difference to the air temperature.
pub fn distance_bias(distance: f64) -> f64 {
    (distance.max(0.).min(DISTANCE_BIAS_CAP) * 0.85 - 1.125) / 100.
}

#[inline]
fn power_series_at(coeffs: &[f64], x: f64) -> f64 {
    let mut pow = 1.;
    let mut sum = 0.;
    for coeff in coeffs.iter() {
        sum += pow * coeff;
        pow *= x;
    }
    sum
}

mod serde_helpers {
    use lazy_static::lazy_static;
    use regex::Regex;
    use serde::*;
    use serde_derive::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    /// Accept a number, or a string beginning with one.
    /// A trailing `%` divides the value by 100.
    pub fn float_with_suffix<'de, D>(de: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^\s*([-+]?(?:\d+\.?\d*|\.\d+))\s*(%)?").unwrap();
        }

        use serde::de::Error;
        let str_rep = match NumberOrText::deserialize(de)? {
            NumberOrText::Number(v) => return Ok(v),
            NumberOrText::Text(s) => s,
        };
        let caps = RE
            .captures(&str_rep)
            .ok_or_else(|| Error::custom("unexpected format: must begin with float"))?;
        let val: f64 = caps[1].parse().map_err(Error::custom)?;

        Ok(if caps.get(2).is_some() { val / 100. } else { val })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(distance: f64, humidity: f64) -> EnvironmentParameters {
        EnvironmentParameters {
            distance,
            humidity,
            ..Default::default()
        }
    }

    #[test]
    fn transmittance_decreases_with_distance() {
        for &humidity in &[0., 0.3, 0.5, 0.9] {
            let ts: Vec<f64> = [0., 1., 5., 20., 50.]
                .iter()
                .map(|&d| AtmosphericCorrection::compute(&env(d, humidity)).transmittance)
                .collect();

            assert!((ts[0] - 1.).abs() < 1e-12);
            for pair in ts.windows(2) {
                assert!(pair[1] < pair[0], "humidity {}: {:?}", humidity, ts);
            }
            for &t in &ts {
                assert!(t > 0. && t <= ATM_K);
            }
        }
    }

    #[test]
    fn negative_distance_reads_as_zero() {
        let neg = AtmosphericCorrection::compute(&env(-4., 0.5));
        let zero = AtmosphericCorrection::compute(&env(0., 0.5));
        assert_eq!(neg, zero);
        assert!(!neg.transmittance.is_nan());
    }

    #[test]
    fn water_vapour_coefficient() {
        let corr = AtmosphericCorrection::compute(&EnvironmentParameters {
            air_temp: 0.,
            humidity: 1.,
            ..Default::default()
        });
        assert!((corr.water_vapour - 1.5587f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn blackbody_at_zero_distance_is_identity() {
        let corr = AtmosphericCorrection::compute(&EnvironmentParameters {
            emissivity: 1.,
            distance: 0.,
            ..Default::default()
        });
        let t = corr.object_temperature(300.);
        assert!((t - (300. + ABSOLUTE_ZERO_CELSIUS)).abs() < 1e-6);
    }

    #[test]
    fn negative_corrected_radiance_is_nan() {
        let corr = AtmosphericCorrection::compute(&EnvironmentParameters {
            emissivity: 0.5,
            distance: 10.,
            ..Default::default()
        });
        assert!(corr.object_temperature(1.).is_nan());
    }

    #[test]
    fn distance_bias_is_capped() {
        assert_eq!(distance_bias(25.), distance_bias(20.));
        assert_eq!(distance_bias(0.), -0.01125);
        assert!(distance_bias(10.) < distance_bias(20.));
    }

    #[test]
    fn parameters_from_json_with_suffixes() -> serde_json::Result<()> {
        let env: EnvironmentParameters = serde_json::from_str(
            r#"{ "air_temp": "21.5 C", "humidity": "45 %", "distance": 3, "emissivity": ".9" }"#,
        )?;
        assert_eq!(env.air_temp, 21.5);
        assert!((env.humidity - 0.45).abs() < 1e-12);
        assert_eq!(env.distance, 3.);
        assert_eq!(env.emissivity, 0.9);
        assert_eq!(env.reflected_temp, EnvironmentParameters::default().reflected_temp);

        assert!(serde_json::from_str::<EnvironmentParameters>(r#"{ "air_temp": "warm" }"#).is_err());
        Ok(())
    }
}
