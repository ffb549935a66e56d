//! Report a position taken from the configuration, for hosts that don't move
use super::GeolocationProvider;
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::geolocation::{Fix, FixOptions, GeolocationError};
use crate::Error;

/// A fixed position, coordinates in degrees and altitude in meters
#[derive(Debug, FromServiceConfig)]
pub struct FixedPosition {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
}

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        FixedPosition {
            latitude,
            longitude,
            altitude,
        }
    }
}

impl Default for FixedPosition {
    fn default() -> Self {
        FixedPosition {
            latitude: f64::NAN,
            longitude: f64::NAN,
            altitude: None,
        }
    }
}

impl GeolocationProvider for FixedPosition {
    fn current_position(&self, _options: &FixOptions) -> Result<Fix, GeolocationError> {
        // an unconfigured position has nothing to report
        if !(self.latitude.is_finite() && self.longitude.is_finite()) {
            return Err(GeolocationError::PositionUnavailable);
        }
        Ok(Fix::new(self.latitude, self.longitude, self.altitude))
    }
}
