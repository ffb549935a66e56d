//! GeoJSON features drawn on top of a track map
use crate::config::OverlayStyle;
use crate::gps::Location;
use crate::track::TrackSource;
use crate::Error;
use geojson::{Feature, FeatureCollection, GeoJson, Value};
use log::{debug, info, warn};
use std::str::FromStr;

/// Features of a GeoJSON document flattened into the lines and points a renderer draws
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    features: Vec<Feature>,
    lines: Vec<Vec<Location>>,
    points: Vec<Location>,
}

impl Overlay {
    pub fn from_geojson(geojson: GeoJson) -> Self {
        let features = match geojson {
            GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection(collection) => collection.features,
        };
        let mut overlay = Overlay {
            features: Vec::new(),
            lines: Vec::new(),
            points: Vec::new(),
        };
        for feature in &features {
            if let Some(geometry) = &feature.geometry {
                overlay.add_geometry(&geometry.value);
            }
        }
        overlay.features = features;
        overlay
    }

    /// Fetch and parse a GeoJSON file or URL
    pub fn load(source: &TrackSource) -> Result<Self, Error> {
        let data = source.fetch()?;
        let text = String::from_utf8(data)
            .map_err(|e| Error::Other(format!("overlay {} is not valid UTF-8: {}", source, e)))?;
        text.parse()
    }

    /// Load an overlay if it is available. A server answering with a non-success status
    /// means there is nothing to draw, any other failure is logged as a warning.
    pub fn fetch(source: &TrackSource) -> Option<Self> {
        match Self::load(source) {
            Ok(overlay) => {
                info!(
                    "Loaded overlay {} with {} features",
                    source,
                    overlay.features.len()
                );
                Some(overlay)
            }
            Err(Error::RequestError(code, _)) => {
                debug!("No overlay drawn, {} answered with {}", source, code);
                None
            }
            Err(e) => {
                warn!("Could not load overlay {}: {}", source, e);
                None
            }
        }
    }

    fn add_geometry(&mut self, value: &Value) {
        match value {
            Value::Point(position) => self.points.extend(to_location(position)),
            Value::MultiPoint(positions) => self
                .points
                .extend(positions.iter().filter_map(|p| to_location(p))),
            Value::LineString(line) => self.add_line(line),
            // polygons are drawn by their rings
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                for line in lines {
                    self.add_line(line);
                }
            }
            Value::MultiPolygon(polygons) => {
                for ring in polygons.iter().flatten() {
                    self.add_line(ring);
                }
            }
            Value::GeometryCollection(geometries) => {
                for geometry in geometries {
                    self.add_geometry(&geometry.value);
                }
            }
        }
    }

    fn add_line(&mut self, positions: &[Vec<f64>]) {
        let line: Vec<Location> = positions.iter().filter_map(|p| to_location(p)).collect();
        if !line.is_empty() {
            self.lines.push(line);
        }
    }

    pub fn lines(&self) -> &[Vec<Location>] {
        &self.lines
    }

    pub fn points(&self) -> &[Location] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty()
    }

    /// The features as a collection carrying simplestyle stroke properties
    pub fn styled(&self, style: &OverlayStyle) -> GeoJson {
        let collection: FeatureCollection = self
            .features
            .iter()
            .cloned()
            .map(|mut feature| {
                feature.set_property("stroke", style.color.clone());
                feature.set_property("stroke-width", style.weight);
                feature.set_property("stroke-opacity", style.opacity);
                feature
            })
            .collect();
        GeoJson::from(collection)
    }
}

impl FromStr for Overlay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Overlay::from_geojson(s.parse::<GeoJson>()?))
    }
}

/// GeoJSON positions are longitude first
fn to_location(position: &[f64]) -> Option<Location> {
    match position {
        [lon, lat, ..] => Some(Location::new(*lat, *lon)),
        _ => None,
    }
}
