//! Helpers for the accompanying binaries: argument parsing,
//! logging and reading frame dumps.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
pub use clap::{App, Arg};
use indicatif::{ProgressBar, ProgressStyle};
pub use inflector::Inflector;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::{calibration::SensorMode, FrameGeometry, RawFrame, Settings};

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Options selecting the [`Settings`]: `--config`,
/// `--sensor-mode` and `--external`.
pub fn with_settings_args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(
        Arg::with_name("config")
            .long("config")
            .short("c")
            .value_name("CONFIG")
            .help("Settings json (default: read parameters from device)"),
    )
    .arg(
        Arg::with_name("sensor mode")
            .long("sensor-mode")
            .short("m")
            .value_name("SENSOR_MODE")
            .possible_values(&["low", "high"])
            .help("Sensor temperature range, overrides the config"),
    )
    .arg(
        Arg::with_name("external")
            .long("external")
            .short("x")
            .takes_value(false)
            .help("Use the environment from the config instead of the device"),
    )
}

pub fn settings_from_matches(matches: &ArgMatches) -> Result<Settings> {
    let mut settings = match matches.value_of("config") {
        Some(path) => Settings::from_json_path(path)?,
        None => Settings::default(),
    };
    match matches.value_of("sensor mode") {
        Some("low") => settings.sensor_mode = SensorMode::Low,
        Some("high") => settings.sensor_mode = SensorMode::High,
        Some(other) => bail!("unknown sensor mode: {}", other),
        None => (),
    }
    if matches.is_present("external") {
        settings.read_params_from_device = false;
    }
    Ok(settings)
}

/// A dump of consecutive raw frames.
pub struct FrameFile {
    pub filename: String,
    pub frames: Vec<crate::Result<RawFrame>>,
}

impl FrameFile {
    /// Split a headerless little-endian dump into frames. A
    /// trailing partial frame is kept as an error.
    pub fn read(filename: String, geometry: FrameGeometry) -> Result<Self> {
        let bytes = fs::read(Path::new(&filename)).with_context(|| format!("reading {}", filename))?;
        let frame_bytes = 2 * geometry.samples();
        if bytes.len() % frame_bytes != 0 {
            warn!(
                "{}: {} trailing bytes do not make a frame",
                filename,
                bytes.len() % frame_bytes
            );
        }
        let frames = bytes
            .chunks(frame_bytes)
            .map(|chunk| RawFrame::from_le_bytes(chunk, geometry))
            .collect();
        Ok(FrameFile { filename, frames })
    }
}

pub fn process_paths_par(
    paths: Vec<String>,
    geometry: FrameGeometry,
) -> impl ParallelIterator<Item = Result<FrameFile>> {
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7}"),
    );

    paths
        .into_par_iter()
        .map(move |p| FrameFile::read(p, geometry))
        .inspect(move |_| bar.inc(1))
}
