//! Define route image subcommand
use crate::config::Config;
use crate::services::{Overlay, TrackMap};
use crate::track::{TrackSource, TrackViewer};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use structopt::StructOpt;

/// Generate a map image of a track with its start, finish and waypoint markers
#[derive(Debug, StructOpt)]
pub struct RouteImageOpts {
    /// GPX file path or http(s) URL of the track
    #[structopt(name = "SOURCE")]
    source: TrackSource,
    /// GeoJSON file path or http(s) URL of features to draw on top of the track
    #[structopt(long)]
    overlay: Option<TrackSource>,
    /// also mark the position at this percentage of the total distance
    #[structopt(short, long, parse(try_from_str = super::parse_percentage))]
    percentage: Option<f64>,
    /// name of file to output image data to, if not provided or "-" is used data is written to stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

pub fn route_image_command(
    config: Config,
    opts: RouteImageOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    // nothing is fetched when there is no map to draw on, failures are logged by the map
    let mut map = match TrackMap::initialize(&config) {
        Some(map) => map,
        None => return Ok(()),
    };
    if let Some(overlay) = opts.overlay.as_ref().and_then(Overlay::fetch) {
        map.set_overlay(overlay);
    }

    let mut viewer = TrackViewer::new();
    viewer.load(opts.source)?;
    if let Some(pct) = opts.percentage {
        viewer.on_slider_input(pct);
    }
    let image_data = match map.draw(&viewer) {
        Some(data) => data,
        None => return Ok(()),
    };
    match opts.output {
        Some(path) if path.to_string_lossy() != "-" => {
            let mut fp = File::create(path)?;
            fp.write_all(&image_data)?
        }
        _ => write_to_stdout(&image_data)?,
    }

    Ok(())
}


fn write_to_stdout(data: &[u8]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(data)
}
