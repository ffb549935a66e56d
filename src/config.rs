//! Store application configuration that gets read from disk
use crate::geolocation::{ElevationFallback, FieldTargetSet, FixOptions};
use crate::services::{
    new_elevation_handler, new_geolocation_handler, new_map_renderer, ElevationDataSource,
    GeolocationProvider, MapRenderer,
};
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;
use simplelog::LevelFilter;
use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::iter::Iterator;
use std::path::Path;
use std::str::FromStr;

pub use track_scrubber_derive::FromServiceConfig;

/// Defines the allowed keys under the services map
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Elevation,
    Geolocation,
    MapRendering,
}

/// Type alias for clarity
pub type ServiceParameters = HashMap<String, Value>;

/// Configuration options for a single service of any type
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    handler: String,
    #[serde(default)]
    configuration: ServiceParameters,
}

impl ServiceConfig {
    pub fn new(handler: String, configuration: ServiceParameters) -> Self {
        ServiceConfig {
            handler,
            configuration,
        }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn parameters(&self) -> impl Iterator<Item = &String> + '_ {
        self.configuration.keys()
    }

    pub fn get_parameter(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    pub fn get_parameter_as_string(&self, key: &str) -> Option<Result<String, Error>> {
        self.configuration.get(key).map(|value| {
            value.as_str().map(|v| v.to_string()).ok_or_else(|| {
                Error::InvalidConfigurationValue(format!(
                    "invalid value for {}.{}, expected a string: {:?}",
                    &self.handler, key, value
                ))
            })
        })
    }

    pub fn get_parameter_as_i64(&self, key: &str) -> Option<Result<i64, Error>> {
        self.configuration.get(key).map(|value| {
            value.as_i64().ok_or_else(|| {
                Error::InvalidConfigurationValue(format!(
                    "invalid value for {}.{}, expected an integer: {:?}",
                    &self.handler, key, value
                ))
            })
        })
    }

    pub fn get_parameter_as_f64(&self, key: &str) -> Option<Result<f64, Error>> {
        self.configuration.get(key).map(|value| {
            value.as_f64().ok_or_else(|| {
                Error::InvalidConfigurationValue(format!(
                    "invalid value for {}.{}, expected a floating point value: {:?}",
                    &self.handler, key, value
                ))
            })
        })
    }

    pub fn get_parameter_as_bool(&self, key: &str) -> Option<Result<bool, Error>> {
        self.configuration.get(key).map(|value| {
            value.as_bool().ok_or_else(|| {
                Error::InvalidConfigurationValue(format!(
                    "invalid value for {}.{}, expected a boolean: {:?}",
                    &self.handler, key, value
                ))
            })
        })
    }
}

/// Build a service handler from its configuration entry
pub trait FromServiceConfig: Sized {
    fn from_config(config: &ServiceConfig) -> Result<Self, Error>;
}

/// Settings used when requesting a position fix and writing it into a form
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    high_accuracy: bool,
    timeout_ms: u64,
    max_fix_age_ms: u64,
    elevation_fallback: ElevationFallback,
    targets: Vec<FieldTargetSet>,
}

impl GeolocationConfig {
    /// Options passed to the position provider
    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.timeout_ms,
            max_fix_age_ms: self.max_fix_age_ms,
        }
    }

    pub fn elevation_fallback(&self) -> ElevationFallback {
        self.elevation_fallback
    }

    /// Candidate form field sets in priority order
    pub fn targets(&self) -> &[FieldTargetSet] {
        &self.targets
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        let options = FixOptions::default();
        GeolocationConfig {
            high_accuracy: options.high_accuracy,
            timeout_ms: options.timeout_ms,
            max_fix_age_ms: options.max_fix_age_ms,
            elevation_fallback: ElevationFallback::Unset,
            targets: vec![
                FieldTargetSet::new("post_lat", "post_lon", "post_ele"),
                FieldTargetSet::new("lat", "lon", "ele"),
            ],
        }
    }
}

/// Icon images used for the markers drawn on top of a track
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerIcons {
    pub start: String,
    pub end: String,
    pub waypoint: String,
    pub position: String,
}

impl Default for MarkerIcons {
    fn default() -> Self {
        MarkerIcons {
            start: "https://cdn.jsdelivr.net/npm/leaflet-gpx@1.5.0/pin-icon-start.png".to_string(),
            end: "https://cdn.jsdelivr.net/npm/leaflet-gpx@1.5.0/pin-icon-end.png".to_string(),
            waypoint: "https://cdn.jsdelivr.net/npm/leaflet-gpx@1.5.0/pin-icon-wpt.png"
                .to_string(),
            position: "https://cdn.jsdelivr.net/npm/leaflet@1.9.4/dist/images/marker-icon.png"
                .to_string(),
        }
    }
}

/// Line style of a GeoJSON overlay drawn on top of the map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            color: "#ff0000".to_string(),
            weight: 20,
            opacity: 1.0,
        }
    }
}

/// Settings for the track viewer and its renderers
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    missing_description: String,
    scrub_step: f64,
    icons: MarkerIcons,
    overlay_style: OverlayStyle,
}

impl ViewerConfig {
    /// Popup text used for waypoints without a description
    pub fn missing_description(&self) -> &str {
        &self.missing_description
    }

    /// Slider percentage moved per key press in the terminal scrubber
    pub fn scrub_step(&self) -> f64 {
        self.scrub_step
    }

    pub fn icons(&self) -> &MarkerIcons {
        &self.icons
    }

    pub fn overlay_style(&self) -> &OverlayStyle {
        &self.overlay_style
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            missing_description: "No description available".to_string(),
            scrub_step: 1.0,
            icons: MarkerIcons::default(),
            overlay_style: OverlayStyle::default(),
        }
    }
}

/// Configuration struct that we can create from the config file used
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(
        deserialize_with = "deserialize_level_filter",
        serialize_with = "serialize_level_filter"
    )]
    log_level: LevelFilter,
    geolocation: GeolocationConfig,
    viewer: ViewerConfig,
    services: HashMap<ServiceType, ServiceConfig>,
}

impl Config {
    pub fn load<T: Read>(source: &mut T) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(source)
    }

    /// Read the configuration file at `path`
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let mut fp = File::open(path)?;
        Ok(Self::load(&mut fp)?)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn geolocation(&self) -> &GeolocationConfig {
        &self.geolocation
    }

    pub fn viewer(&self) -> &ViewerConfig {
        &self.viewer
    }

    /// Register or replace the configuration of a service
    pub fn set_service(&mut self, service: ServiceType, config: ServiceConfig) {
        self.services.insert(service, config);
    }

    pub fn get_elevation_handler(&self) -> Result<Box<dyn ElevationDataSource>, Error> {
        match self.services.get(&ServiceType::Elevation) {
            Some(cfg) => new_elevation_handler(cfg),
            None => Err(Error::UnknownServiceHandler(
                "no service configuration defined for elevation".to_string(),
            )),
        }
    }

    pub fn get_geolocation_handler(&self) -> Result<Box<dyn GeolocationProvider>, Error> {
        match self.services.get(&ServiceType::Geolocation) {
            Some(cfg) => new_geolocation_handler(cfg),
            None => Err(Error::UnknownServiceHandler(
                "no service configuration defined for geolocation".to_string(),
            )),
        }
    }

    pub fn get_map_renderer(&self) -> Result<Box<dyn MapRenderer>, Error> {
        match self.services.get(&ServiceType::MapRendering) {
            Some(cfg) => new_map_renderer(cfg),
            None => Err(Error::MappingUnavailable(
                "no service configuration defined for map rendering".to_string(),
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_level_filter(),
            geolocation: GeolocationConfig::default(),
            viewer: ViewerConfig::default(),
            services: HashMap::new(),
        }
    }
}

fn deserialize_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    LevelFilter::from_str(&buf)
        .map_err(|_| serde::de::Error::custom(format!("invalid level value: {}", buf)))
}

fn serialize_level_filter<S>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&level.to_string())
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}
