//! Define the application's command line interface
use crate::config::Config;
use simplelog::LevelFilter;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

mod locate;
use locate::{locate_command, LocateOpts};
mod route_image;
use route_image::{route_image_command, RouteImageOpts};
mod scrub;
use scrub::{scrub_command, ScrubOpts};
mod show_track;
use show_track::{show_track_command, ShowTrackOpts};

/// Scrub through GPS tracks and fill location forms from a position fix
#[derive(Debug, StructOpt)]
#[structopt(name = "track-scrubber")]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// Configuration file to use instead of the one in the user's config directory
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        self.cmd.execute(config)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Fill the location fields of a form file with the current position
    #[structopt(name = "locate")]
    Locate(LocateOpts),
    /// Create a map image of a track
    #[structopt(name = "route-image")]
    RouteImage(RouteImageOpts),
    /// Interactively scrub through a track on the terminal
    #[structopt(name = "scrub")]
    Scrub(ScrubOpts),
    /// Print a track summary and the position at one or more slider percentages
    #[structopt(name = "show-track")]
    ShowTrack(ShowTrackOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Locate(opts) => locate_command(config, opts),
            Command::RouteImage(opts) => route_image_command(config, opts),
            Command::Scrub(opts) => scrub_command(config, opts),
            Command::ShowTrack(opts) => show_track_command(config, opts),
        }
    }
}

fn parse_percentage(src: &str) -> Result<f64, String> {
    let value: f64 = src
        .parse()
        .map_err(|e| format!("invalid percentage {}: {}", src, e))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("percentage must be between 0 and 100: {}", src))
    }
}
