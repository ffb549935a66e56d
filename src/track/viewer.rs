//! Position readout driven by a 0-100% slider over a loaded track
use super::{CumulativeDistanceTable, Track, TrackSource, Trackpoint, Waypoint};
use crate::gps::{BoundingBox, Location};
use crate::Error;
use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use std::sync::mpsc;
use std::thread;

/// Format a point timestamp for display, "N/A" when the point has none
pub fn format_timestamp(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "N/A".to_string(),
    }
}

/// Format a distance in meters as kilometers with two decimals
pub fn format_distance_km(meters: f64) -> String {
    format!("{:.2}", meters / 1000.0)
}

fn format_info(distance: f64, time: Option<DateTime<Utc>>) -> String {
    format!(
        "Distance: {} km | Time: {}",
        format_distance_km(distance),
        format_timestamp(time)
    )
}

/// What the viewer currently displays
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewerState {
    percentage: f64,
    index: Option<usize>,
    marker: Option<Location>,
    distance: f64,
    info: String,
}

impl ViewerState {
    /// Slider value of the last input that resolved to a point
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Index of the trackpoint under the marker
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn marker(&self) -> Option<&Location> {
        self.marker.as_ref()
    }

    /// Distance along the track to the marker in meters
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn info(&self) -> &str {
        &self.info
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerPhase {
    Unloaded,
    Loaded,
    Interactive,
}

/// Notifications sent to registered listeners
#[derive(Debug)]
pub enum ViewerEvent<'a> {
    /// A track finished loading and replaced the previous one
    Loaded {
        points: usize,
        total_distance: f64,
        bounds: Option<BoundingBox>,
    },
    /// Sent once per waypoint while a track is applied, before `Loaded`
    WaypointAdded(&'a Waypoint),
    /// The slider moved the marker
    PositionChanged(&'a ViewerState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&ViewerEvent<'_>)>;

/// Handle to a track load running on a worker thread
#[derive(Debug)]
pub struct PendingLoad {
    generation: u64,
    source: TrackSource,
    receiver: mpsc::Receiver<Result<Track, Error>>,
}

impl PendingLoad {
    pub fn source(&self) -> &TrackSource {
        &self.source
    }
}

/// Owns a track, its distance table and the slider state for one map
pub struct TrackViewer {
    track: Track,
    table: CumulativeDistanceTable,
    state: ViewerState,
    phase: ViewerPhase,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
    generation: u64,
}

impl TrackViewer {
    pub fn new() -> Self {
        TrackViewer {
            track: Track::default(),
            table: CumulativeDistanceTable::default(),
            state: ViewerState::default(),
            phase: ViewerPhase::Unloaded,
            listeners: Vec::new(),
            next_listener: 0,
            generation: 0,
        }
    }

    /// Start fetching and parsing a track in the background.
    ///
    /// Only the most recently started load is applied, completing an older one is a no-op.
    pub fn begin_load(&mut self, source: TrackSource) -> PendingLoad {
        self.generation += 1;
        let (sender, receiver) = mpsc::channel();
        let worker_source = source.clone();
        thread::spawn(move || {
            let result = worker_source.load();
            // the viewer may have dropped the pending load already
            sender.send(result).ok();
        });
        debug!("Started loading track {} (load #{})", source, self.generation);

        PendingLoad {
            generation: self.generation,
            source,
            receiver,
        }
    }

    /// Wait for a load to finish and apply it. Returns `Ok(false)` without touching the
    /// viewer when a newer load was started in the meantime.
    pub fn complete_load(&mut self, pending: PendingLoad) -> Result<bool, Error> {
        // a superseded worker is left to finish on its own, its send fails once we drop the receiver
        if pending.generation != self.generation {
            debug!(
                "Discarding stale track load #{} from {} (current load #{})",
                pending.generation, pending.source, self.generation
            );
            return Ok(false);
        }
        let track = pending.receiver.recv().map_err(|_| {
            Error::Other(format!(
                "track loader for {} exited without a result",
                pending.source
            ))
        })??;
        info!(
            "Loaded track {} with {} points and {} waypoints",
            pending.source,
            track.points().len(),
            track.waypoints().len()
        );
        self.set_track(track);
        Ok(true)
    }

    /// Load a track and apply it before returning
    pub fn load(&mut self, source: TrackSource) -> Result<(), Error> {
        let pending = self.begin_load(source);
        self.complete_load(pending).map(|_| ())
    }

    /// Replace the current track, rebuilding the distance table and resetting the slider state.
    ///
    /// Any load still in flight is superseded by this track.
    pub fn set_track(&mut self, track: Track) {
        self.generation += 1;
        self.table = CumulativeDistanceTable::build(track.points());
        self.track = track;
        self.state = ViewerState::default();
        self.phase = ViewerPhase::Loaded;
        trace!(
            "Distance table built with {} entries, total {:.1}m",
            self.table.len(),
            self.table.total()
        );

        for waypoint in self.track.waypoints() {
            emit(&mut self.listeners, &ViewerEvent::WaypointAdded(waypoint));
        }
        let loaded = ViewerEvent::Loaded {
            points: self.track.points().len(),
            total_distance: self.table.total(),
            bounds: self.track.bounds(),
        };
        emit(&mut self.listeners, &loaded);
    }

    /// Move the marker to the point at `percentage` of the total distance.
    ///
    /// Returns false and leaves the displayed state alone when the track is empty or the
    /// percentage does not resolve to a point.
    pub fn on_slider_input(&mut self, percentage: f64) -> bool {
        if self.track.is_empty() {
            return false;
        }
        let index = match self.table.resolve(percentage) {
            Some(index) => index,
            None => {
                trace!("Slider value {} does not resolve to a trackpoint", percentage);
                return false;
            }
        };
        let (point, distance) = match (self.track.points().get(index), self.table.get(index)) {
            (Some(point), Some(distance)) => (point, distance),
            _ => return false,
        };

        self.state = ViewerState {
            percentage,
            index: Some(index),
            marker: Some(*point.location()),
            distance,
            info: format_info(distance, point.time()),
        };
        self.phase = ViewerPhase::Interactive;
        emit(&mut self.listeners, &ViewerEvent::PositionChanged(&self.state));
        true
    }

    /// Register a listener for viewer events
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ViewerEvent<'_>) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener, returns false if it was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let count = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != count
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn distances(&self) -> &CumulativeDistanceTable {
        &self.table
    }

    pub fn total_distance(&self) -> f64 {
        self.table.total()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    /// The trackpoint under the marker
    pub fn current_point(&self) -> Option<&Trackpoint> {
        self.state.index.and_then(|idx| self.track.points().get(idx))
    }
}

impl Default for TrackViewer {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(listeners: &mut [(ListenerId, Listener)], event: &ViewerEvent<'_>) {
    for (_, listener) in listeners.iter_mut() {
        listener(event);
    }
}
