//! Request a single position fix and write it into the fields of a form
use crate::config::Config;
use crate::gps::Location;
use crate::services::{ElevationDataSource, GeolocationProvider};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

mod form;
pub use form::FormFields;

/// A single geolocation reading
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fix {
    /// latitude in degrees
    pub latitude: f64,
    /// longitude in degrees
    pub longitude: f64,
    /// altitude in meters, not every provider can measure it
    pub altitude: Option<f64>,
    /// horizontal accuracy radius in meters if reported
    pub accuracy: Option<f64>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        Fix {
            latitude,
            longitude,
            altitude,
            accuracy: None,
        }
    }

    pub fn location(&self) -> Location {
        Location::with_elevation(self.latitude, self.longitude, self.altitude)
    }
}

/// Options for a single position request
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixOptions {
    /// prefer the most precise positioning method available
    pub high_accuracy: bool,
    /// give up and report `GeolocationError::Timeout` after this many milliseconds
    pub timeout_ms: u64,
    /// accept a cached fix no older than this, 0 always requests a fresh one
    pub max_fix_age_ms: u64,
}

impl Default for FixOptions {
    fn default() -> Self {
        FixOptions {
            high_accuracy: true,
            timeout_ms: 5000,
            max_fix_age_ms: 0,
        }
    }
}

/// Reasons a position request can fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeolocationError::PermissionDenied => write!(f, "permission to read the position was denied"),
            GeolocationError::PositionUnavailable => write!(f, "position unavailable"),
            GeolocationError::Timeout => write!(f, "position request timed out"),
        }
    }
}

impl std::error::Error for GeolocationError {}

/// A document holding named input fields that can be overwritten
pub trait FormDocument {
    /// Return true if a field with the given id exists
    fn has_field(&self, id: &str) -> bool;

    /// Overwrite the value of an existing field
    fn set_field(&mut self, id: &str, value: String);
}

/// Ids of the three fields a fix gets written into
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTargetSet {
    latitude: String,
    longitude: String,
    elevation: String,
}

impl FieldTargetSet {
    pub fn new(latitude: &str, longitude: &str, elevation: &str) -> Self {
        FieldTargetSet {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            elevation: elevation.to_string(),
        }
    }

    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    pub fn longitude(&self) -> &str {
        &self.longitude
    }

    pub fn elevation(&self) -> &str {
        &self.elevation
    }

    /// A set is usable when the document has both of its coordinate fields
    pub fn exists_in(&self, form: &dyn FormDocument) -> bool {
        form.has_field(&self.latitude) && form.has_field(&self.longitude)
    }
}

/// What gets written into the elevation field when a fix carries no altitude
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationFallback {
    /// clear the field
    Unset,
    /// write 0
    Zero,
    /// query the elevation service, clear the field if that yields nothing
    Lookup,
}

/// Fills location form fields from a one-shot position request
pub struct GeolocationFiller {
    provider: Option<Box<dyn GeolocationProvider>>,
    elevation_source: Option<Box<dyn ElevationDataSource>>,
    options: FixOptions,
    targets: Vec<FieldTargetSet>,
    fallback: ElevationFallback,
}

impl GeolocationFiller {
    pub fn new(provider: Box<dyn GeolocationProvider>, targets: Vec<FieldTargetSet>) -> Self {
        GeolocationFiller {
            provider: Some(provider),
            elevation_source: None,
            options: FixOptions::default(),
            targets,
            fallback: ElevationFallback::Unset,
        }
    }

    /// Build a filler from the application configuration. A missing or broken provider is
    /// logged and leaves the filler unable to produce fixes, every request then fails with
    /// `PositionUnavailable`.
    pub fn from_config(config: &Config) -> Self {
        let settings = config.geolocation();
        let provider = match config.get_geolocation_handler() {
            Ok(hdl) => Some(hdl),
            Err(e) => {
                warn!("Could not initialize the geolocation service: {}", e);
                None
            }
        };
        let elevation_source = if settings.elevation_fallback() == ElevationFallback::Lookup {
            match config.get_elevation_handler() {
                Ok(hdl) => Some(hdl),
                Err(e) => {
                    error!("Could not initialize the elevation service {}", e);
                    None
                }
            }
        } else {
            None
        };

        GeolocationFiller {
            provider,
            elevation_source,
            options: settings.fix_options(),
            targets: settings.targets().to_vec(),
            fallback: settings.elevation_fallback(),
        }
    }

    pub fn set_options(&mut self, options: FixOptions) {
        self.options = options;
    }

    pub fn options(&self) -> FixOptions {
        self.options
    }

    /// Choose what to write when a fix lacks altitude, `source` is only used for `Lookup`
    pub fn set_elevation_fallback(
        &mut self,
        fallback: ElevationFallback,
        source: Option<Box<dyn ElevationDataSource>>,
    ) {
        self.fallback = fallback;
        self.elevation_source = source;
    }

    /// Request exactly one fix and hand it to `on_success`, or the failure reason to
    /// `on_error`. There are no retries.
    pub fn request_fix<S, E>(&self, on_success: S, on_error: E, options: &FixOptions)
    where
        S: FnOnce(Fix),
        E: FnOnce(GeolocationError),
    {
        let result = match &self.provider {
            Some(provider) => provider.current_position(options),
            None => Err(GeolocationError::PositionUnavailable),
        };
        match result {
            Ok(fix) => on_success(fix),
            Err(e) => on_error(e),
        }
    }

    /// Request a fix and write it into the first target set present in the form. Failures
    /// leave the form untouched and are not reported to the caller.
    pub fn grab(&self, form: &mut dyn FormDocument) {
        self.request_fix(
            |fix| {
                self.write_fix(&fix, form);
            },
            |e| debug!("Ignoring failed position request: {}", e),
            &self.options,
        );
    }

    /// Write a fix into the first configured target set that exists in the form, returning
    /// the set that was used
    pub fn write_fix(&self, fix: &Fix, form: &mut dyn FormDocument) -> Option<&FieldTargetSet> {
        let target = match self.targets.iter().find(|t| t.exists_in(form)) {
            Some(target) => target,
            None => {
                debug!("No target fields found in form, dropping fix {:?}", fix);
                return None;
            }
        };

        form.set_field(&target.latitude, fix.latitude.to_string());
        form.set_field(&target.longitude, fix.longitude.to_string());
        if form.has_field(&target.elevation) {
            let elevation = fix
                .altitude
                .or_else(|| self.fallback_elevation(fix))
                .map(|v| v.to_string())
                .unwrap_or_default();
            form.set_field(&target.elevation, elevation);
        }
        info!(
            "Wrote position {:.6}, {:.6} into fields {}/{}/{}",
            fix.latitude, fix.longitude, target.latitude, target.longitude, target.elevation
        );

        Some(target)
    }

    fn fallback_elevation(&self, fix: &Fix) -> Option<f64> {
        match self.fallback {
            ElevationFallback::Unset => None,
            ElevationFallback::Zero => Some(0.0),
            ElevationFallback::Lookup => {
                let source = self.elevation_source.as_ref()?;
                let mut locations = [fix.location()];
                match source.request_elevation_data(&mut locations) {
                    Ok(()) => locations[0].elevation(),
                    Err(e) => {
                        warn!("Elevation lookup for {:?} failed: {}", fix, e);
                        None
                    }
                }
            }
        }
    }
}
