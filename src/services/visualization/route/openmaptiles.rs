//! Use an instance of open map tiles (tileserver-gl) to draw a track and its markers
use super::{MapRenderer, MapView};
use crate::config::{FromServiceConfig, OverlayStyle, ServiceConfig};
use crate::gps::{BoundingBox, Location};
use crate::Error;
use log::debug;
use reqwest::blocking::Client;

/// Defines connection parameters to request static map images from an OpenMapTiles server
#[derive(Debug, FromServiceConfig)]
pub struct OpenMapTiles {
    base_url: String,
    style: String,
    image_width: u32,
    image_height: u32,
    image_format: String,
    stroke_color: String,
    stroke_width: u32,
    padding: f64,
}

impl OpenMapTiles {
    pub fn new(base_url: String, style: String) -> Self {
        OpenMapTiles {
            base_url,
            style,
            ..Default::default()
        }
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn set_image_width(&mut self, width: u32) {
        self.image_width = width;
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn set_image_height(&mut self, height: u32) {
        self.image_height = height;
    }

    fn request_url(&self, bounds: &BoundingBox) -> String {
        // Ex.: http://localhost:8080/styles/osm-bright/static/-80.1465,39.46,-80.1313,39.4842/1800x1200.png
        format!(
            "{}/styles/{}/static/{},{},{},{}/{}x{}.{}",
            self.base_url,
            self.style,
            bounds.min_lon(),
            bounds.min_lat(),
            bounds.max_lon(),
            bounds.max_lat(),
            self.image_width,
            self.image_height,
            self.image_format
        )
    }

    fn path_param(trace: &[Location]) -> String {
        trace
            .iter()
            .map(|l| format!("{},{}", l.longitude(), l.latitude()))
            .collect::<Vec<String>>()
            .join("|")
    }

    fn query_params(&self, view: &MapView) -> Vec<(&'static str, String)> {
        let mut params = vec![("padding", self.padding.to_string())];
        if !view.trace().is_empty() {
            params.push(("stroke", self.stroke_color.clone()));
            params.push(("width", self.stroke_width.to_string()));
            params.push(("path", Self::path_param(view.trace())));
        }
        if let Some(overlay) = view.overlay() {
            // tileserver-gl takes the style of each path as a prefix
            let style = view.overlay_style();
            let prefix = format!("stroke:{}|width:{}|fill:none", css_color(style), style.weight);
            for line in overlay.lines() {
                params.push(("path", format!("{}|{}", prefix, Self::path_param(line))));
            }
            if !overlay.points().is_empty() {
                debug!("OpenMapTiles skips {} overlay points", overlay.points().len());
            }
        }
        for marker in view.markers() {
            let loc = marker.location();
            params.push((
                "marker",
                format!("{},{}|{}", loc.longitude(), loc.latitude(), marker.icon_url()),
            ));
        }
        params
    }
}

/// The overlay color with its opacity folded in when it is a plain hex color
fn css_color(style: &OverlayStyle) -> String {
    let hex = style.color.trim_start_matches('#');
    if style.opacity < 1.0 && hex.len() == 6 {
        if let Ok(rgb) = u32::from_str_radix(hex, 16) {
            return format!(
                "rgba({},{},{},{})",
                rgb >> 16,
                (rgb >> 8) & 0xff,
                rgb & 0xff,
                style.opacity
            );
        }
    }
    style.color.clone()
}

impl Default for OpenMapTiles {
    fn default() -> Self {
        OpenMapTiles {
            base_url: "http://localhost:8080".to_string(),
            style: "osm-bright".to_string(),
            image_width: 1800,
            image_height: 1200,
            image_format: "png".to_string(), // other formats are available but the list is short
            stroke_color: "red".to_string(),
            stroke_width: 3,
            padding: 0.1,
        }
    }
}

impl MapRenderer for OpenMapTiles {
    fn render(&self, view: &MapView) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let client = Client::new();
        let resp = client
            .get(&self.request_url(view.bounds()))
            .query(&self.query_params(view))
            .send()?;
        if resp.status().is_success() {
            Ok(resp.bytes()?.to_vec())
        } else {
            let code = resp.status();
            Err(Box::new(Error::RequestError(
                code,
                "OpenMapTiles drawing failed".to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServiceParameters, ViewerConfig};
    use crate::services::visualization::route::Overlay;
    use crate::track::{Track, TrackViewer, Trackpoint, Waypoint};
    use serde_yaml::Value;

    fn view() -> MapView {
        let mut viewer = TrackViewer::new();
        viewer.set_track(Track::new(
            vec![
                Trackpoint::new(Location::new(39.46, -80.1465), None),
                Trackpoint::new(Location::new(39.4842, -80.1313), None),
            ],
            vec![Waypoint::new(Location::new(39.47, -80.14), None, None)],
        ));
        MapView::from_viewer(&viewer, &ViewerConfig::default()).unwrap()
    }

    #[test]
    fn test_from_config() {
        let mut params = ServiceParameters::new();
        params.insert("base_url".to_string(), Value::from("http://tiles.local"));
        params.insert("style".to_string(), Value::from("klokantech-basic"));
        params.insert("image_width".to_string(), Value::from(800));
        let omt = OpenMapTiles::from_config(&ServiceConfig::new(
            "openmaptiles".to_string(),
            params,
        ))
        .unwrap();
        assert_eq!(omt.image_width(), 800);
        assert_eq!(omt.image_height(), 1200);
        assert_eq!(
            omt.request_url(view().bounds()),
            "http://tiles.local/styles/klokantech-basic/static/-80.1465,39.46,-80.1313,39.4842/800x1200.png"
        );
    }

    #[test]
    fn test_query_params() {
        let omt = OpenMapTiles::default();
        let params = omt.query_params(&view());
        assert_eq!(params[0], ("padding", "0.1".to_string()));
        assert_eq!(
            params[3],
            ("path", "-80.1465,39.46|-80.1313,39.4842".to_string())
        );
        let markers: Vec<&String> = params
            .iter()
            .filter(|(k, _)| *k == "marker")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(markers.len(), 3);
        assert!(markers[0].starts_with("-80.1465,39.46|https://"));
        assert!(markers[2].ends_with("pin-icon-wpt.png"));
    }

    #[test]
    fn test_overlay_lines_are_styled_paths() {
        let overlay: Overlay = r#"{
            "type": "MultiLineString",
            "coordinates": [[[-80.2, 39.4], [-80.1, 39.5]], [[-80.3, 39.3], [-80.2, 39.2]]]
        }"#
        .parse()
        .unwrap();
        let params = OpenMapTiles::default().query_params(&view().with_overlay(overlay));
        let paths: Vec<&String> = params
            .iter()
            .filter(|(k, _)| *k == "path")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(
            paths[1],
            "stroke:#ff0000|width:20|fill:none|-80.2,39.4|-80.1,39.5"
        );
        assert!(paths[2].ends_with("|-80.3,39.3|-80.2,39.2"));
    }

    #[test]
    fn test_css_color() {
        let mut style = OverlayStyle::default();
        assert_eq!(css_color(&style), "#ff0000");
        style.opacity = 0.5;
        assert_eq!(css_color(&style), "rgba(255,0,0,0.5)");
        style.color = "red".to_string();
        assert_eq!(css_color(&style), "red");
    }
}
