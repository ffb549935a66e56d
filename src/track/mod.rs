//! GPS tracks loaded from GPX files or URLs
use crate::gps::{BoundingBox, Location};
use crate::Error;
use chrono::{DateTime, TimeZone, Utc};
use gpx::Gpx;
use log::{debug, trace};
use reqwest::blocking::Client;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;
use std::str::FromStr;

pub mod distance;
pub mod viewer;
pub use distance::CumulativeDistanceTable;
pub use viewer::{
    format_distance_km, format_timestamp, ListenerId, PendingLoad, TrackViewer, ViewerEvent,
    ViewerPhase, ViewerState,
};

/// A point along the track path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trackpoint {
    location: Location,
    time: Option<DateTime<Utc>>,
}

impl Trackpoint {
    pub fn new(location: Location, time: Option<DateTime<Utc>>) -> Self {
        Trackpoint { location, time }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }
}

/// A labeled point of interest that is not part of the path
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    location: Location,
    name: Option<String>,
    description: Option<String>,
}

impl Waypoint {
    pub fn new(location: Location, name: Option<String>, description: Option<String>) -> Self {
        Waypoint {
            location,
            name,
            description,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Text shown when the waypoint is selected, `placeholder` if it has no description
    pub fn popup_text<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.description().unwrap_or(placeholder)
    }
}

/// A parsed track: the flattened path and its waypoints
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    points: Vec<Trackpoint>,
    waypoints: Vec<Waypoint>,
}

impl Track {
    pub fn new(points: Vec<Trackpoint>, waypoints: Vec<Waypoint>) -> Self {
        Track { points, waypoints }
    }

    /// Parse GPX data. Route points come first followed by every track segment in document
    /// order, segments are concatenated as-is.
    pub fn from_gpx(gpx: Gpx) -> Self {
        let route_points = gpx.routes.iter().flat_map(|rte| rte.points.iter());
        let track_points = gpx
            .tracks
            .iter()
            .flat_map(|trk| trk.segments.iter())
            .flat_map(|seg| seg.points.iter());
        let points: Vec<Trackpoint> = route_points
            .chain(track_points)
            .map(|wpt| Trackpoint::new(to_location(wpt), to_utc(wpt)))
            .collect();

        let waypoints = gpx
            .waypoints
            .iter()
            .map(|wpt| {
                Waypoint::new(to_location(wpt), wpt.name.clone(), wpt.description.clone())
            })
            .collect();

        Track { points, waypoints }
    }

    pub fn read<R: Read>(source: R) -> Result<Self, Error> {
        let gpx = gpx::read(source)?;
        trace!(
            "Parsed GPX data with {} routes, {} tracks and {} waypoints",
            gpx.routes.len(),
            gpx.tracks.len(),
            gpx.waypoints.len()
        );
        Ok(Self::from_gpx(gpx))
    }

    pub fn points(&self) -> &[Trackpoint] {
        &self.points
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounds of the path and the waypoints
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_locations(
            self.points
                .iter()
                .map(Trackpoint::location)
                .chain(self.waypoints.iter().map(Waypoint::location)),
        )
    }
}

fn to_location(wpt: &gpx::Waypoint) -> Location {
    let point = wpt.point();
    Location::with_elevation(point.y(), point.x(), wpt.elevation)
}

fn to_utc(wpt: &gpx::Waypoint) -> Option<DateTime<Utc>> {
    let stamp: time::OffsetDateTime = wpt.time.clone()?.into();
    Utc.timestamp_opt(stamp.unix_timestamp(), stamp.nanosecond())
        .single()
}

/// Where a track is loaded from
#[derive(Clone, Debug, PartialEq)]
pub enum TrackSource {
    Path(PathBuf),
    Url(reqwest::Url),
}

impl TrackSource {
    /// Fetch and parse the track
    pub fn load(&self) -> Result<Track, Error> {
        Track::read(Cursor::new(self.fetch()?))
    }

    /// Read the raw contents, a non-success HTTP status is a `RequestError`
    pub fn fetch(&self) -> Result<Vec<u8>, Error> {
        match self {
            TrackSource::Path(path) => {
                debug!("Reading {:?}", path);
                let mut data = Vec::new();
                BufReader::new(File::open(path)?).read_to_end(&mut data)?;
                Ok(data)
            }
            TrackSource::Url(url) => {
                debug!("Fetching {}", url);
                let client = Client::new();
                let resp = client.get(url.clone()).send()?;
                if resp.status().is_success() {
                    Ok(resp.bytes()?.to_vec())
                } else {
                    let code = resp.status();
                    Err(Error::RequestError(
                        code,
                        format!("could not fetch {}", url),
                    ))
                }
            }
        }
    }
}

impl FromStr for TrackSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            reqwest::Url::parse(s)
                .map(TrackSource::Url)
                .map_err(|e| Error::Other(format!("invalid track URL {}: {}", s, e)))
        } else {
            Ok(TrackSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSource::Path(path) => write!(f, "{}", path.display()),
            TrackSource::Url(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="39.47" lon="-80.14">
    <name>Overlook</name>
    <desc>View of the valley</desc>
  </wpt>
  <wpt lat="39.48" lon="-80.13">
    <name>Bench</name>
  </wpt>
  <trk>
    <trkseg>
      <trkpt lat="39.46" lon="-80.15"><ele>300</ele><time>2024-03-05T07:08:09Z</time></trkpt>
      <trkpt lat="39.461" lon="-80.151"><time>2024-03-05T07:09:09Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="39.462" lon="-80.152"></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

    #[test]
    fn test_segments_are_concatenated_in_order() {
        let track = Track::read(GPX.as_bytes()).unwrap();
        let lats: Vec<f64> = track.points().iter().map(|p| p.location().latitude()).collect();
        assert_eq!(lats, vec![39.46, 39.461, 39.462]);
        assert_eq!(track.points()[0].location().elevation(), Some(300.0));
        assert_eq!(
            track.points()[0].time(),
            Some("2024-03-05T07:08:09Z".parse::<DateTime<Utc>>().unwrap())
        );
        assert_eq!(track.points()[2].time(), None);
    }

    #[test]
    fn test_waypoint_popups() {
        let track = Track::read(GPX.as_bytes()).unwrap();
        assert_eq!(track.waypoints().len(), 2);
        assert_eq!(track.waypoints()[0].name(), Some("Overlook"));
        assert_eq!(track.waypoints()[0].popup_text("n/a"), "View of the valley");
        assert_eq!(track.waypoints()[1].popup_text("n/a"), "n/a");
    }

    #[test]
    fn test_bounds_include_waypoints() {
        let track = Track::read(GPX.as_bytes()).unwrap();
        let bounds = track.bounds().unwrap();
        assert_eq!(bounds.min_lat(), 39.46);
        assert_eq!(bounds.max_lat(), 39.48);
        assert_eq!(bounds.min_lon(), -80.152);
        assert_eq!(bounds.max_lon(), -80.13);
        assert!(Track::default().bounds().is_none());
    }

    #[test]
    fn test_invalid_gpx_is_an_error() {
        assert!(Track::read("<not-gpx/>".as_bytes()).is_err());
    }

    #[test]
    fn test_track_source_from_str() {
        assert_eq!(
            "tracks/ride.gpx".parse::<TrackSource>().unwrap(),
            TrackSource::Path(PathBuf::from("tracks/ride.gpx"))
        );
        match "https://example.com/ride.gpx".parse::<TrackSource>().unwrap() {
            TrackSource::Url(url) => assert_eq!(url.path(), "/ride.gpx"),
            other => panic!("expected a URL source, got {:?}", other),
        }
        assert!("http://".parse::<TrackSource>().is_err());
    }
}
