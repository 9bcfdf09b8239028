//! Error type shared by the decode and calibration stages.
use std::{fmt::Display, io};

use thiserror::Error;

/// Failures while decoding a frame or reading temperatures
/// out of a LUT.
///
/// Only [`Error::MalformedMetadata`] is fatal for a frame.
/// The other two variants describe a single LUT entry or
/// summary field; the corresponding value is `NaN`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("raw code {code} is outside the calibration domain")]
    CalibrationDomain { code: u16 },

    #[error("{field}: raw code {code} exceeds the LUT domain")]
    IndexOutOfRange { field: &'static str, code: usize },
}

impl Error {
    /// Prefix a metadata error with `ctx`. Other variants
    /// are returned unchanged.
    pub(crate) fn context<C: Display>(self, ctx: C) -> Self {
        match self {
            Error::MalformedMetadata(msg) => Error::MalformedMetadata(format!("{}: {}", ctx, msg)),
            other => other,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::MalformedMetadata("unexpected end of buffer".into()),
            _ => Error::MalformedMetadata(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
