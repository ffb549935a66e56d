//! Use the MapBox static images API to draw a track and its markers
use super::{MapRenderer, MapView, Marker, MarkerKind};
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::gps::{encode_coordinates, BoundingBox};
use crate::Error;
use reqwest::blocking::Client;

/// Defines parameters to interact with the MapBox API
#[derive(Debug, FromServiceConfig)]
pub struct MapBox {
    base_url: String,
    #[service_config(skip)]
    api_version: &'static str,
    username: String,
    style: String,
    image_width: u32,
    image_height: u32,
    stroke_color: String,
    stroke_width: u32,
    stroke_opacity: f32,
    padding: u32,
    access_token: String,
}

impl MapBox {
    fn request_url(&self, view: &MapView) -> String {
        let mut overlays = Vec::new();
        if let Some(overlay) = view.overlay() {
            let styled = overlay.styled(view.overlay_style()).to_string();
            let encoded: String = form_urlencoded::byte_serialize(styled.as_bytes()).collect();
            overlays.push(format!("geojson({})", encoded));
        }
        if !view.trace().is_empty() {
            let encoded: String =
                form_urlencoded::byte_serialize(encode_coordinates(view.trace()).as_bytes())
                    .collect();
            overlays.push(format!(
                "path-{}+{}-{}({})",
                self.stroke_width, self.stroke_color, self.stroke_opacity, encoded
            ));
        }
        overlays.extend(view.markers().iter().map(pin_overlay));

        format!(
            "{}/styles/{}/{}/{}/static/{}/{}/{}x{}",
            self.base_url,
            self.api_version,
            self.username,
            self.style,
            overlays.join(","),
            bbox_param(view.bounds()),
            self.image_width,
            self.image_height,
        )
    }
}

/// MapBox pins only take a lowercase letter or a number below 100 as label
fn pin_overlay(marker: &Marker) -> String {
    let color = match marker.kind() {
        MarkerKind::Start => "2a2",
        MarkerKind::End => "a22",
        MarkerKind::Waypoint => "28f",
        MarkerKind::Position => "fa0",
    };
    let label = marker.label().to_ascii_lowercase();
    let valid = match label.parse::<u32>() {
        Ok(n) => n < 100,
        Err(_) => label.len() == 1 && label.chars().all(|c| c.is_ascii_lowercase()),
    };
    let loc = marker.location();
    if valid {
        format!(
            "pin-l-{}+{}({},{})",
            label,
            color,
            loc.longitude(),
            loc.latitude()
        )
    } else {
        format!("pin-l+{}({},{})", color, loc.longitude(), loc.latitude())
    }
}

fn bbox_param(bounds: &BoundingBox) -> String {
    format!(
        "[{},{},{},{}]",
        bounds.min_lon(),
        bounds.min_lat(),
        bounds.max_lon(),
        bounds.max_lat()
    )
}

impl Default for MapBox {
    fn default() -> Self {
        MapBox {
            base_url: "https://api.mapbox.com".to_string(),
            api_version: "v1",
            username: "mapbox".to_string(),
            style: "streets-v11".to_string(),
            image_width: 1280,
            image_height: 1280,
            stroke_color: "f44".to_string(),
            stroke_width: 3,
            stroke_opacity: 0.50,
            padding: 20,
            access_token: String::new(),
        }
    }
}

impl MapRenderer for MapBox {
    fn render(&self, view: &MapView) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if self.access_token.is_empty() {
            return Err(Box::new(Error::InvalidConfigurationValue(
                "MapBox requires an access_token".to_string(),
            )));
        }
        let client = Client::new();
        let resp = client
            .get(&self.request_url(view))
            .query(&[("access_token", &self.access_token)])
            .query(&[("padding", self.padding)])
            .send()?;
        if resp.status().is_success() {
            Ok(resp.bytes()?.to_vec())
        } else {
            let code = resp.status();
            Err(Box::new(Error::RequestError(
                code,
                "MapBox drawing failed".to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServiceParameters, ViewerConfig};
    use crate::gps::Location;
    use crate::services::visualization::route::Overlay;
    use crate::track::{Track, TrackViewer, Trackpoint, Waypoint};
    use serde_yaml::Value;

    fn view(waypoints: usize) -> MapView {
        let mut viewer = TrackViewer::new();
        let wpts = (0..waypoints)
            .map(|i| Waypoint::new(Location::new(38.5, -120.2 + i as f64 * 0.001), None, None))
            .collect();
        viewer.set_track(Track::new(
            vec![
                Trackpoint::new(Location::new(38.5, -120.2), None),
                Trackpoint::new(Location::new(40.7, -120.95), None),
                Trackpoint::new(Location::new(43.252, -126.453), None),
            ],
            wpts,
        ));
        viewer.on_slider_input(0.0);
        MapView::from_viewer(&viewer, &ViewerConfig::default()).unwrap()
    }

    #[test]
    fn test_request_url() {
        let mut params = ServiceParameters::new();
        params.insert("access_token".to_string(), Value::from("pk.test"));
        params.insert("style".to_string(), Value::from("outdoors-v11"));
        let mapbox =
            MapBox::from_config(&ServiceConfig::new("mapbox".to_string(), params)).unwrap();
        assert_eq!(mapbox.access_token, "pk.test");
        assert_eq!(
            mapbox.request_url(&view(1)),
            "https://api.mapbox.com/styles/v1/mapbox/outdoors-v11/static/\
             path-3+f44-0.5(_p%7EiF%7Eps%7CU_ulLnnqC_mqNvxq%60%40),\
             pin-l-s+2a2(-120.2,38.5),pin-l-f+a22(-126.453,43.252),\
             pin-l-1+28f(-120.2,38.5),pin-l-p+fa0(-120.2,38.5)/\
             [-126.453,38.5,-120.2,43.252]/1280x1280"
        );
    }

    #[test]
    fn test_large_waypoint_numbers_drop_the_label() {
        let view = view(100);
        let last_wpt = &view.markers()[view.markers().len() - 2];
        assert_eq!(last_wpt.label(), "100");
        assert!(pin_overlay(last_wpt).starts_with("pin-l+28f("));
    }

    #[test]
    fn test_overlay_is_drawn_below_the_track() {
        let overlay: Overlay = r#"{"type": "Point", "coordinates": [-120.5, 39.0]}"#
            .parse()
            .unwrap();
        let url = MapBox::default().request_url(&view(0).with_overlay(overlay));
        let overlays = url.split("/static/").nth(1).unwrap();
        assert!(overlays.starts_with("geojson(%7B%22"));
        assert!(overlays.contains("%22stroke%22%3A%22%23ff0000%22"));
        assert!(overlays.contains("%22stroke-width%22%3A20"));
        let path = overlays.find("),path-3+f44-0.5(").unwrap();
        assert!(path > overlays.find("-120.5%2C39").unwrap());
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(MapBox::default().render(&view(0)).is_err());
    }
}
