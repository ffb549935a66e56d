//! Define show-track subcommand
use crate::config::Config;
use crate::track::{format_distance_km, TrackSource, TrackViewer, ViewerEvent};
use std::io::{self, Write};
use structopt::StructOpt;

/// Print a track summary, its waypoints and the info line at the requested positions
#[derive(Debug, StructOpt)]
pub struct ShowTrackOpts {
    /// GPX file path or http(s) URL of the track
    #[structopt(name = "SOURCE")]
    source: TrackSource,
    /// slider position as a percentage of the total distance, can be given more than once
    #[structopt(short, long, parse(try_from_str = super::parse_percentage))]
    percentage: Vec<f64>,
}

pub fn show_track_command(
    config: Config,
    opts: ShowTrackOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let placeholder = config.viewer().missing_description().to_string();
    let mut viewer = TrackViewer::new();
    let mut lines: Vec<String> = Vec::new();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    // collect what the viewer reports while loading, waypoints arrive before the summary
    let (tx, rx) = std::sync::mpsc::channel();
    let listener = viewer.add_listener(move |event| {
        let line = match event {
            ViewerEvent::Loaded {
                points,
                total_distance,
                ..
            } => format!(
                "Loaded {} points, total distance {} km",
                points,
                format_distance_km(*total_distance)
            ),
            ViewerEvent::WaypointAdded(wpt) => format!(
                "Waypoint {}: {}",
                wpt.name().unwrap_or("(unnamed)"),
                wpt.popup_text(&placeholder)
            ),
            ViewerEvent::PositionChanged(_) => return,
        };
        tx.send(line).ok();
    });
    viewer.load(opts.source)?;
    viewer.remove_listener(listener);
    lines.extend(rx.try_iter());

    for line in &lines {
        writeln!(handle, "{}", line)?;
    }
    for pct in opts.percentage {
        if viewer.on_slider_input(pct) {
            writeln!(handle, "{:>6.2}% | {}", pct, viewer.state().info())?;
        } else {
            writeln!(handle, "{:>6.2}% | no trackpoint at this position", pct)?;
        }
    }
    Ok(())
}
