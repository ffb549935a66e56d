//! Draw a track on top of a basemap using an external map rendering service
use crate::config::{Config, FromServiceConfig, OverlayStyle, ServiceConfig, ViewerConfig};
use crate::gps::{BoundingBox, Location};
use crate::track::{Trackpoint, TrackViewer};
use crate::Error;
use log::{debug, error};
mod mapbox;
mod openmaptiles;
mod overlay;
pub use mapbox::MapBox;
pub use openmaptiles::OpenMapTiles;
pub use overlay::Overlay;

/// Smallest span in degrees a rendered map covers, a single point has no extent to fit
const MIN_SPAN: f64 = 0.002;

/// trait that defines how a map view is turned into image data
pub trait MapRenderer {
    /// Render the basemap, the trace, any overlay and every marker fit to the view bounds
    fn render(&self, view: &MapView) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}

pub fn new_map_renderer(config: &ServiceConfig) -> Result<Box<dyn MapRenderer>, Error> {
    match config.handler() {
        "mapbox" => Ok(Box::new(MapBox::from_config(config)?)),
        "openmaptiles" => Ok(Box::new(OpenMapTiles::from_config(config)?)),
        _ => Err(Error::MappingUnavailable(format!(
            "no map rendering handler exists for: {}",
            config.handler()
        ))),
    }
}

/// What a marker on the map stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    End,
    Waypoint,
    Position,
}

/// A labeled icon drawn on top of the trace
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    kind: MarkerKind,
    location: Location,
    label: String,
    icon_url: String,
    popup: Option<String>,
}

impl Marker {
    pub fn new(kind: MarkerKind, location: Location, label: String, icon_url: String) -> Self {
        Marker {
            kind,
            location,
            label,
            icon_url,
            popup: None,
        }
    }

    pub fn with_popup(mut self, popup: String) -> Self {
        self.popup = Some(popup);
        self
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon_url(&self) -> &str {
        &self.icon_url
    }

    pub fn popup(&self) -> Option<&str> {
        self.popup.as_deref()
    }
}

/// Everything a renderer needs to draw one track
#[derive(Clone, Debug, PartialEq)]
pub struct MapView {
    trace: Vec<Location>,
    bounds: BoundingBox,
    markers: Vec<Marker>,
    overlay: Option<Overlay>,
    overlay_style: OverlayStyle,
}

impl MapView {
    /// Snapshot the loaded track and the current slider position. Returns `None` when there
    /// is nothing to fit the map to.
    pub fn from_viewer(viewer: &TrackViewer, config: &ViewerConfig) -> Option<Self> {
        let track = viewer.track();
        let bounds = fit_bounds(track.bounds()?);
        let icons = config.icons();
        let trace: Vec<Location> = track
            .points()
            .iter()
            .map(Trackpoint::location)
            .copied()
            .collect();

        let mut markers = Vec::new();
        if let (Some(first), Some(last)) = (trace.first(), trace.last()) {
            markers.push(Marker::new(
                MarkerKind::Start,
                *first,
                "S".to_string(),
                icons.start.clone(),
            ));
            markers.push(Marker::new(
                MarkerKind::End,
                *last,
                "F".to_string(),
                icons.end.clone(),
            ));
        }
        for (i, wpt) in track.waypoints().iter().enumerate() {
            let marker = Marker::new(
                MarkerKind::Waypoint,
                *wpt.location(),
                (i + 1).to_string(),
                icons.waypoint.clone(),
            );
            let popup = wpt.popup_text(config.missing_description()).to_string();
            markers.push(marker.with_popup(popup));
        }
        if let Some(position) = viewer.state().marker() {
            markers.push(
                Marker::new(
                    MarkerKind::Position,
                    *position,
                    "P".to_string(),
                    icons.position.clone(),
                )
                .with_popup(viewer.state().info().to_string()),
            );
        }

        Some(MapView {
            trace,
            bounds,
            markers,
            overlay: None,
            overlay_style: config.overlay_style().clone(),
        })
    }

    /// Draw GeoJSON features on top of the map, the bounds stay fit to the track
    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn trace(&self) -> &[Location] {
        &self.trace
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn overlay_style(&self) -> &OverlayStyle {
        &self.overlay_style
    }

    /// Label and popup text of every marker that carries one
    pub fn popups(&self) -> Vec<(&str, &str)> {
        self.markers
            .iter()
            .filter_map(|m| m.popup().map(|text| (m.label(), text)))
            .collect()
    }
}

/// Widen a box that is too small to frame, keeping its center
fn fit_bounds(bounds: BoundingBox) -> BoundingBox {
    let lat_span = bounds.max_lat() - bounds.min_lat();
    let lon_span = bounds.max_lon() - bounds.min_lon();
    if lat_span >= MIN_SPAN && lon_span >= MIN_SPAN {
        return bounds;
    }
    let center = bounds.center();
    let half_lat = lat_span.max(MIN_SPAN) / 2.0;
    let half_lon = lon_span.max(MIN_SPAN) / 2.0;
    let corners = [
        Location::new(center.latitude() - half_lat, center.longitude() - half_lon),
        Location::new(center.latitude() + half_lat, center.longitude() + half_lon),
    ];
    BoundingBox::from_locations(corners.iter()).unwrap_or(bounds)
}

/// A map bound to a rendering service
pub struct TrackMap {
    renderer: Box<dyn MapRenderer>,
    viewer_config: ViewerConfig,
    overlay: Option<Overlay>,
}

impl TrackMap {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(TrackMap::with_renderer(
            config.get_map_renderer()?,
            config.viewer().clone(),
        ))
    }

    pub fn with_renderer(renderer: Box<dyn MapRenderer>, viewer_config: ViewerConfig) -> Self {
        TrackMap {
            renderer,
            viewer_config,
            overlay: None,
        }
    }

    /// Set up the map from the configured renderer. A missing or broken renderer is logged
    /// and nothing is returned, the caller has nothing left to do.
    pub fn initialize(config: &Config) -> Option<Self> {
        match TrackMap::new(config) {
            Ok(map) => Some(map),
            Err(e) => {
                error!("Could not initialize the map: {}", e);
                None
            }
        }
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Render the viewer's track, `None` if it has no points or waypoints
    pub fn render(
        &self,
        viewer: &TrackViewer,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
        let mut view = match MapView::from_viewer(viewer, &self.viewer_config) {
            Some(view) => view,
            None => return Ok(None),
        };
        if let Some(overlay) = &self.overlay {
            view = view.with_overlay(overlay.clone());
        }
        debug!(
            "Rendering map with {} points and {} markers",
            view.trace().len(),
            view.markers().len()
        );
        self.renderer.render(&view).map(Some)
    }

    /// Render the map for a loaded viewer. Any failure is logged and nothing is returned,
    /// there is never a partial image.
    pub fn draw(&self, viewer: &TrackViewer) -> Option<Vec<u8>> {
        match self.render(viewer) {
            Ok(Some(data)) => Some(data),
            Ok(None) => {
                error!("Track has no points or waypoints to draw");
                None
            }
            Err(e) => {
                error!("Map rendering failed: {}", e);
                None
            }
        }
    }
}
