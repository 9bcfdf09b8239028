//! Decode the metadata trailer of a frame.
//!
//! The camera appends four rows below the image. Row 0
//! carries per-frame statistics as `u16` words; row 3 starts
//! with the device block and holds the environment
//! parameters further in. Rows 1 and 2 are not decoded.
//!
//! All fields are little-endian. Layout of row 0, by word:
//!
//! - 0: FPA average, 1: FPA raw reading
//! - 2, 3: max pixel x, y; 4: max raw code
//! - 5, 6: min pixel x, y; 7: min raw code
//! - 8: original average; 9..12: reserved
//! - 12: center raw code; 13..16: probe raw codes
//!
//! Layout of row 3, by byte:
//!
//! - 0: device fix code (`u16`), 2: core temperature raw
//!   code (`u16`), 4: reserved
//! - 6..26: calibration constants `a0..a4` (`f32`)
//! - 254..274: fix offset, reflected temperature, air
//!   temperature, humidity, emissivity (`f32`)
//! - 274: distance (`u16`)
use serde_derive::*;
use tracing::debug;

use crate::{
    calibration::{CalibrationConstants, DerivedReadings},
    environment::EnvironmentParameters,
    error::{Error, Result},
    frame::{RawFrame, TRAILER_ROWS},
    parse::parse_le_at,
};

/// Offset of the environment parameters within row 3.
pub const ENVIRONMENT_OFFSET: usize = 254;

/// Bytes of row 3 that are read: the environment block ends
/// with the `u16` distance at 274.
pub const DEVICE_ROW_LEN: usize = ENVIRONMENT_OFFSET + 5 * 4 + 2;

declare_parseable_struct! {
    /// Per-frame statistics from row 0.
    #[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameStats {
        pub fpa_avg => u16,
        pub fpa_raw => u16,
        pub max_x => u16,
        pub max_y => u16,
        pub max_raw => u16,
        pub min_x => u16,
        pub min_y => u16,
        pub min_raw => u16,
        pub org_avg => u16,
        #[serde(skip)]
        pub(crate) _reserved as "reserved" => [u16; 3],
        pub center_raw => u16,
        pub probe_raw => [u16; 3],
    }
}

declare_parseable_struct! {
    /// Head of row 3.
    #[derive(Serialize, Debug, Clone, Copy, PartialEq)]
    pub struct DeviceBlock {
        pub fix_code => u16,
        pub core_raw => u16,
        #[serde(skip)]
        _reserved as "reserved" => u16,
        pub calibration => CalibrationConstants,
    }
}

/// Everything decoded from a trailer.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct FrameMetadata {
    pub stats: FrameStats,
    pub device: DeviceBlock,
    /// As stored by the device.
    pub environment: EnvironmentParameters,
    pub readings: DerivedReadings,
}

impl FrameMetadata {
    /// Decode the trailer of a frame given as bytes:
    /// four rows of `row_bytes` each.
    ///
    /// Fails with [`Error::MalformedMetadata`] when the
    /// buffer is too short for any field read.
    pub fn from_trailer(trailer: &[u8], row_bytes: usize) -> Result<Self> {
        if row_bytes < DEVICE_ROW_LEN {
            return Err(Error::MalformedMetadata(format!(
                "rows of {} bytes cannot hold the {} byte device block",
                row_bytes, DEVICE_ROW_LEN
            )));
        }
        let needed = (TRAILER_ROWS - 1) * row_bytes + DEVICE_ROW_LEN;
        if trailer.len() < needed {
            return Err(Error::MalformedMetadata(format!(
                "trailer of {} bytes is shorter than the {} bytes read",
                trailer.len(),
                needed
            )));
        }

        let row0 = &trailer[..row_bytes];
        let row3 = &trailer[3 * row_bytes..];

        let stats: FrameStats = parse_le_at(row0, 0, "row 0")?;
        let device: DeviceBlock = parse_le_at(row3, 0, "device block")?;
        let environment: EnvironmentParameters =
            parse_le_at(row3, ENVIRONMENT_OFFSET, "environment block")?;
        let readings = DerivedReadings::from_raw(device.core_raw, stats.fpa_raw);

        debug!(
            fix_code = device.fix_code,
            core_raw = device.core_raw,
            core_temp = readings.core_temp,
            fpa_raw = stats.fpa_raw,
            fpa_temp = readings.fpa_temp,
            "decoded device readings"
        );
        debug!(calibration = ?device.calibration, environment = ?environment, "decoded device parameters");

        Ok(FrameMetadata {
            stats,
            device,
            environment,
            readings,
        })
    }

    /// Decode the trailer of `frame`.
    pub fn from_frame(frame: &RawFrame) -> Result<Self> {
        Self::from_trailer(&frame.trailer_bytes(), frame.geometry().row_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: usize = 768;

    fn put_u16(buf: &mut [u8], at: usize, v: u16) {
        buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_f32(buf: &mut [u8], at: usize, v: f32) {
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn sample_trailer() -> Vec<u8> {
        let mut buf = vec![0u8; 4 * ROW];
        for (word, v) in [100u16, 7836, 10, 11, 9000, 20, 21, 4000, 6000]
            .iter()
            .enumerate()
        {
            put_u16(&mut buf, 2 * word, *v);
        }
        put_u16(&mut buf, 2 * 12, 6500);
        put_u16(&mut buf, 2 * 13, 1);
        put_u16(&mut buf, 2 * 15, 3);

        let row3 = 3 * ROW;
        put_u16(&mut buf, row3, 42);
        put_u16(&mut buf, row3 + 2, 2981);
        for (i, a) in [1.5f32, -2., 0.25, 4., 5.].iter().enumerate() {
            put_f32(&mut buf, row3 + 6 + 4 * i, *a);
        }
        for (i, v) in [0.5f32, 22., 23., 0.5, 0.75].iter().enumerate() {
            put_f32(&mut buf, row3 + ENVIRONMENT_OFFSET + 4 * i, *v);
        }
        put_u16(&mut buf, row3 + 274, 7);
        buf
    }

    #[test]
    fn decodes_fixed_offsets() -> Result<()> {
        let meta = FrameMetadata::from_trailer(&sample_trailer(), ROW)?;

        assert_eq!(meta.stats.fpa_avg, 100);
        assert_eq!(meta.stats.fpa_raw, 7836);
        assert_eq!((meta.stats.max_x, meta.stats.max_y), (10, 11));
        assert_eq!(meta.stats.max_raw, 9000);
        assert_eq!((meta.stats.min_x, meta.stats.min_y), (20, 21));
        assert_eq!(meta.stats.min_raw, 4000);
        assert_eq!(meta.stats.org_avg, 6000);
        assert_eq!(meta.stats.center_raw, 6500);
        assert_eq!(meta.stats.probe_raw, [1, 0, 3]);

        assert_eq!(meta.device.fix_code, 42);
        assert_eq!(meta.device.core_raw, 2981);
        assert_eq!(
            meta.device.calibration,
            CalibrationConstants {
                a0: 1.5,
                a1: -2.,
                a2: 0.25,
                a3: 4.,
                a4: 5.
            }
        );

        let env = meta.environment;
        assert_eq!(env.fix_offset, 0.5);
        assert_eq!(env.reflected_temp, 22.);
        assert_eq!(env.air_temp, 23.);
        assert_eq!(env.humidity, 0.5);
        assert_eq!(env.emissivity, 0.75);
        assert_eq!(env.distance, 7.);

        assert_eq!(meta.readings.fpa_temp, 19.);
        Ok(())
    }

    #[test]
    fn out_of_range_values_pass_through() -> Result<()> {
        let mut buf = sample_trailer();
        put_f32(&mut buf, 3 * ROW + ENVIRONMENT_OFFSET + 16, 7.5);
        put_u16(&mut buf, 2 * 4, u16::MAX);
        let meta = FrameMetadata::from_trailer(&buf, ROW)?;
        assert_eq!(meta.environment.emissivity, 7.5);
        assert_eq!(meta.stats.max_raw, u16::MAX);
        Ok(())
    }

    #[test]
    fn short_trailer_is_malformed() {
        let buf = sample_trailer();
        let cut = 3 * ROW + DEVICE_ROW_LEN - 1;
        assert!(matches!(
            FrameMetadata::from_trailer(&buf[..cut], ROW),
            Err(Error::MalformedMetadata(_))
        ));
        assert!(FrameMetadata::from_trailer(&buf[..cut + 1], ROW).is_ok());
    }

    #[test]
    fn narrow_rows_are_malformed() {
        assert!(matches!(
            FrameMetadata::from_trailer(&[0; 4 * 100], 100),
            Err(Error::MalformedMetadata(_))
        ));
    }
}
