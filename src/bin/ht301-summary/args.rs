use anyhow::Result;
use ht301::{arg, args_parser, cli, opt, FrameGeometry, Settings};

pub struct Args {
    pub paths: Vec<String>,
    pub settings: Settings,
    pub geometry: FrameGeometry,
    pub pretty: bool,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = cli::with_settings_args(
            args_parser!("ht301-summary")
                .about("Report center / min / max temperatures of raw HT301 frame dumps.")
                .arg(
                    opt!("pretty")
                        .short("p")
                        .takes_value(false)
                        .help("Pretty print the json output"),
                )
                .arg(
                    arg!("paths")
                        .required(true)
                        .multiple(true)
                        .help("Frame dump paths"),
                ),
        )
        .get_matches();

        let paths = matches
            .values_of("paths")
            .map(|v| v.map(|f| f.into()).collect())
            .unwrap_or_default();
        let settings = cli::settings_from_matches(&matches)?;
        let pretty = matches.is_present("pretty");

        Ok(Args {
            paths,
            settings,
            geometry: FrameGeometry::HT301,
            pretty,
        })
    }
}
