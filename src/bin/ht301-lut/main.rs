mod args;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use tracing::info;

use ht301::{cli::{self, FrameFile}, process_frame};

use crate::args::Args;

fn main() -> Result<()> {
    cli::init_logging();
    let args = Args::from_cmd_line()?;

    let FrameFile { filename, mut frames } = FrameFile::read(args.path.clone(), args.geometry)?;
    if args.frame >= frames.len() {
        return Err(anyhow!(
            "{} holds {} frames, frame {} requested",
            filename,
            frames.len(),
            args.frame
        ));
    }
    let frame = frames
        .swap_remove(args.frame)
        .with_context(|| format!("{} frame {}", filename, args.frame))?;
    let processed = process_frame(&frame, &args.settings)?;

    let invalid = processed.lut.domain_errors().count();
    info!(
        center = processed.summary.center.temperature,
        min = processed.summary.min.temperature,
        max = processed.summary.max.temperature,
        invalid,
        "built LUT for {} frame {}",
        filename,
        args.frame
    );

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(writer);
    writeln!(writer, "{}", processed.lut.iter().format("\n"))?;
    writer.flush()?;
    Ok(())
}
