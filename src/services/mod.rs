//! Service module that exports interfaces to external applications, APIs, etc.

pub mod elevation;
pub mod geolocation;
pub mod visualization;

// rexport some traits and utilty functions
pub use elevation::{new_elevation_handler, ElevationDataSource};
pub use geolocation::{new_geolocation_handler, GeolocationProvider};
pub use visualization::route::{
    new_map_renderer, MapRenderer, MapView, Marker, Overlay, TrackMap,
};
pub use visualization::scrubber::TerminalScrubber;
