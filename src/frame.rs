//! Captured frames: the image area plus the metadata
//! trailer the camera appends below it.
use byteordered::ByteOrdered;
use ndarray::{s, Array2, ArrayView2};

use crate::error::{Error, Result};

/// Number of metadata rows appended to every frame.
pub const TRAILER_ROWS: usize = 4;

/// Dimensions of the image area of a frame (excludes the
/// trailer rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: usize,
    pub height: usize,
}

impl FrameGeometry {
    /// The HT301 sensor: 384x288 pixels.
    pub const HT301: FrameGeometry = FrameGeometry {
        width: 384,
        height: 288,
    };

    /// Rows in a captured frame, trailer included.
    pub fn total_rows(&self) -> usize {
        self.height + TRAILER_ROWS
    }

    /// Number of `u16` samples in a captured frame.
    pub fn samples(&self) -> usize {
        self.width * self.total_rows()
    }

    /// Number of bytes in one row.
    pub fn row_bytes(&self) -> usize {
        2 * self.width
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        FrameGeometry::HT301
    }
}

/// A captured frame: `height + 4` rows of raw `u16`
/// samples.
#[derive(Debug, Clone)]
pub struct RawFrame {
    geometry: FrameGeometry,
    data: Array2<u16>,
}

impl RawFrame {
    /// Wrap a `(height + 4, width)` array.
    pub fn new(data: Array2<u16>, geometry: FrameGeometry) -> Result<Self> {
        let expected = (geometry.total_rows(), geometry.width);
        if data.dim() != expected {
            return Err(Error::MalformedMetadata(format!(
                "frame shape {:?} does not match geometry {:?}",
                data.dim(),
                expected
            )));
        }
        Ok(RawFrame { geometry, data })
    }

    /// Decode a frame from little-endian samples, row-major.
    pub fn from_le_bytes(bytes: &[u8], geometry: FrameGeometry) -> Result<Self> {
        let samples = geometry.samples();
        if bytes.len() != 2 * samples {
            return Err(Error::MalformedMetadata(format!(
                "expected {} bytes for a {}x{} frame, found {}",
                2 * samples,
                geometry.width,
                geometry.total_rows(),
                bytes.len()
            )));
        }

        let mut rdr = ByteOrdered::le(bytes);
        let mut data = Vec::with_capacity(samples);
        for _ in 0..samples {
            data.push(rdr.read_u16()?);
        }
        let data = Array2::from_shape_vec((geometry.total_rows(), geometry.width), data)
            .map_err(|e| Error::MalformedMetadata(e.to_string()))?;
        Ok(RawFrame { geometry, data })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Raw codes of the image area.
    pub fn image(&self) -> ArrayView2<'_, u16> {
        self.data.slice(s![..self.geometry.height, ..])
    }

    /// The four metadata rows.
    pub fn trailer(&self) -> ArrayView2<'_, u16> {
        self.data.slice(s![self.geometry.height.., ..])
    }

    /// The trailer serialized back to its on-wire
    /// little-endian byte layout.
    pub fn trailer_bytes(&self) -> Vec<u8> {
        let trailer = self.trailer();
        let mut out = ByteOrdered::le(Vec::with_capacity(TRAILER_ROWS * self.geometry.row_bytes()));
        for &sample in trailer.iter() {
            // writes into a Vec cannot fail
            let _ = out.write_u16(sample);
        }
        out.into_inner()
    }
}
