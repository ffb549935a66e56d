//! Define scrub subcommand
use crate::config::Config;
use crate::services::TerminalScrubber;
use crate::track::{TrackSource, TrackViewer};
use log::{info, warn};
use structopt::StructOpt;

/// Move a position marker along a track with the keyboard
#[derive(Debug, StructOpt)]
pub struct ScrubOpts {
    /// GPX file path or http(s) URL of the track
    #[structopt(name = "SOURCE")]
    source: TrackSource,
}

pub fn scrub_command(config: Config, opts: ScrubOpts) -> Result<(), Box<dyn std::error::Error>> {
    let mut viewer = TrackViewer::new();
    info!("Loading track from: {}", opts.source);
    viewer.load(opts.source)?;
    if viewer.track().is_empty() {
        warn!("Track has no points, the slider will not move the marker");
    }

    let mut scrubber = TerminalScrubber::new(config.viewer());
    scrubber.run(&mut viewer)
}
