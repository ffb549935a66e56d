use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::NamedTempFile;
use track_scrubber::track::{Track, TrackSource, TrackViewer, ViewerEvent, ViewerPhase};

const RIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="0.0" lon="0.015"><name>Halfway</name><desc>Water fountain</desc></wpt>
  <trk>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"><time>2024-03-05T07:08:09Z</time></trkpt>
      <trkpt lat="0.0" lon="0.01"><time>2024-03-05T07:10:09Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="0.0" lon="0.02"><time>2024-03-05T07:12:09Z</time></trkpt>
      <trkpt lat="0.0" lon="0.03"></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

const SINGLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg><trkpt lat="45.0" lon="7.0"></trkpt></trkseg></trk>
</gpx>
"#;

fn gpx_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn source(file: &NamedTempFile) -> TrackSource {
    TrackSource::Path(file.path().to_path_buf())
}

#[test]
fn scrub_through_a_loaded_track() {
    let file = gpx_file(RIDE);
    let mut viewer = TrackViewer::new();
    assert_eq!(viewer.phase(), ViewerPhase::Unloaded);
    viewer.load(source(&file)).unwrap();
    assert_eq!(viewer.phase(), ViewerPhase::Loaded);
    assert_eq!(viewer.track().points().len(), 4);
    assert_eq!(viewer.distances().len(), 4);

    assert!(viewer.on_slider_input(0.0));
    assert_eq!(viewer.state().index(), Some(0));
    assert_eq!(
        viewer.state().info(),
        "Distance: 0.00 km | Time: 2024-03-05 07:08:09 UTC"
    );
    assert_eq!(viewer.phase(), ViewerPhase::Interactive);

    // 50% of three equal steps lands between the second and third point
    assert!(viewer.on_slider_input(50.0));
    assert_eq!(viewer.state().index(), Some(2));
    assert_eq!(
        viewer.state().info(),
        "Distance: 2.22 km | Time: 2024-03-05 07:12:09 UTC"
    );

    assert!(viewer.on_slider_input(90.0));
    assert_eq!(viewer.state().index(), Some(3));
    assert_eq!(viewer.state().info(), "Distance: 3.34 km | Time: N/A");
}

#[test]
fn out_of_range_input_keeps_prior_state() {
    let file = gpx_file(RIDE);
    let mut viewer = TrackViewer::new();
    viewer.load(source(&file)).unwrap();
    assert!(viewer.on_slider_input(50.0));
    let before = viewer.state().clone();

    assert!(!viewer.on_slider_input(150.0));
    assert!(!viewer.on_slider_input(-25.0));
    assert!(!viewer.on_slider_input(f64::NAN));
    assert_eq!(viewer.state(), &before);
}

#[test]
fn single_point_track_always_resolves_to_that_point() {
    let file = gpx_file(SINGLE);
    let mut viewer = TrackViewer::new();
    viewer.load(source(&file)).unwrap();
    for pct in &[0.0, 33.3, 99.0, 100.0] {
        assert!(viewer.on_slider_input(*pct));
        assert_eq!(viewer.state().index(), Some(0));
        assert_eq!(viewer.state().distance(), 0.0);
    }
    assert!(!viewer.on_slider_input(150.0));
    assert_eq!(viewer.state().percentage(), 100.0);
}

#[test]
fn empty_viewer_ignores_slider() {
    let mut viewer = TrackViewer::new();
    assert!(!viewer.on_slider_input(25.0));
    assert_eq!(viewer.state().index(), None);
    assert_eq!(viewer.phase(), ViewerPhase::Unloaded);
}

#[test]
fn stale_load_is_discarded() {
    let first = gpx_file(RIDE);
    let second = gpx_file(SINGLE);
    let mut viewer = TrackViewer::new();

    let stale = viewer.begin_load(source(&first));
    let latest = viewer.begin_load(source(&second));
    assert!(!viewer.complete_load(stale).unwrap());
    assert_eq!(viewer.phase(), ViewerPhase::Unloaded);
    assert!(viewer.complete_load(latest).unwrap());
    assert_eq!(viewer.track().points().len(), 1);
}

#[test]
fn direct_track_replaces_pending_load() {
    let file = gpx_file(RIDE);
    let mut viewer = TrackViewer::new();

    let pending = viewer.begin_load(source(&file));
    viewer.set_track(Track::read(SINGLE.as_bytes()).unwrap());
    assert!(!viewer.complete_load(pending).unwrap());
    assert_eq!(viewer.track().points().len(), 1);
    assert_eq!(viewer.phase(), ViewerPhase::Loaded);
}

#[test]
fn listeners_see_waypoints_before_load() {
    let file = gpx_file(RIDE);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    let mut viewer = TrackViewer::new();
    viewer.add_listener(move |event| {
        let name = match event {
            ViewerEvent::WaypointAdded(wpt) => format!("waypoint:{}", wpt.popup_text("-")),
            ViewerEvent::Loaded { points, .. } => format!("loaded:{}", points),
            ViewerEvent::PositionChanged(state) => format!("position:{:?}", state.index()),
        };
        sink.borrow_mut().push(name);
    });
    viewer.load(source(&file)).unwrap();
    viewer.on_slider_input(0.0);
    assert_eq!(
        *events.borrow(),
        vec!["waypoint:Water fountain", "loaded:4", "position:Some(0)"]
    );
}

#[test]
fn missing_file_is_an_error() {
    let mut viewer = TrackViewer::new();
    let result = viewer.load(TrackSource::Path(PathBuf::from("/nonexistent/ride.gpx")));
    assert!(result.is_err());
    assert_eq!(viewer.phase(), ViewerPhase::Unloaded);
}
