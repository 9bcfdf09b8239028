mod args;

use anyhow::Result;
use args::Args;
use rayon::iter::ParallelIterator;
use serde_derive::*;
use tracing::{info, warn};

use ht301::{
    calibration::DerivedReadings,
    cli::{self, process_paths_par, FrameFile},
    FrameProcessor, FrameSummary, Settings,
};

#[derive(Serialize, Debug)]
struct FrameReport {
    path: String,
    frame: usize,
    /// Set when the frame failed to decode and the summary
    /// is carried over from an earlier frame.
    stale: bool,
    readings: DerivedReadings,
    summary: FrameSummary,
}

fn main() -> Result<()> {
    cli::init_logging();
    let Args {
        paths,
        settings,
        geometry,
        pretty,
    } = Args::from_cmd_line()?;

    let reports = process_paths_par(paths, geometry)
        .map(|file| -> Result<_> { Ok(summarize_file(file?, settings)) })
        .try_fold(Vec::new, |mut acc, reports| -> Result<_> {
            acc.extend(reports?);
            Ok(acc)
        })
        .try_reduce(Vec::new, |mut a, b| {
            a.extend(b);
            Ok(a)
        })?;

    info!("summarized {} frames", reports.len());

    let out = std::io::stdout();
    if pretty {
        serde_json::to_writer_pretty(out.lock(), &reports)?;
    } else {
        serde_json::to_writer(out.lock(), &reports)?;
    }
    Ok(())
}

/// Frames of one dump are processed in order so a failed
/// frame can fall back on the previous one.
fn summarize_file(file: FrameFile, settings: Settings) -> Vec<FrameReport> {
    let FrameFile { filename, frames } = file;
    let mut processor = FrameProcessor::new(settings);
    let mut reports = Vec::with_capacity(frames.len());

    for (idx, frame) in frames.into_iter().enumerate() {
        let fresh = match frame {
            Ok(frame) => processor.push(&frame).is_ok(),
            Err(e) => {
                warn!("{} frame {}: {}", filename, idx, e);
                false
            }
        };
        if let Some(latest) = processor.latest() {
            reports.push(FrameReport {
                path: filename.clone(),
                frame: idx,
                stale: !fresh,
                readings: latest.metadata.readings,
                summary: latest.summary.clone(),
            });
        }
    }
    reports
}
