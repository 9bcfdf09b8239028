use std::path::PathBuf;

use anyhow::Result;
use clap::value_t_or_exit;
use ht301::{arg, args_parser, cli, opt, FrameGeometry, Settings};

pub struct Args {
    pub path: String,
    pub frame: usize,
    pub output: Option<PathBuf>,
    pub settings: Settings,
    pub geometry: FrameGeometry,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = cli::with_settings_args(
            args_parser!("ht301-lut")
                .about("Dump the temperature LUT of a frame as csv, one value per raw code.")
                .arg(
                    opt!("frame")
                        .short("f")
                        .help("Index of the frame in the dump.  Default is 0"),
                )
                .arg(
                    opt!("output")
                        .short("o")
                        .help("Output path (default: stdout)"),
                )
                .arg(arg!("path").required(true).help("Frame dump path")),
        )
        .get_matches();

        let path = value_t_or_exit!(matches, "path", String);
        let frame = matches
            .is_present("frame")
            .then(|| value_t_or_exit!(matches.value_of("frame"), usize))
            .unwrap_or(0);
        let output = matches.value_of("output").map(PathBuf::from);
        let settings = cli::settings_from_matches(&matches)?;

        Ok(Args {
            path,
            frame,
            output,
            settings,
            geometry: FrameGeometry::HT301,
        })
    }
}
