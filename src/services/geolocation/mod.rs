//! Sources of a device position fix
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::geolocation::{Fix, FixOptions, GeolocationError};
use crate::Error;
mod fixed;
mod geolocate_api;
pub use fixed::FixedPosition;
pub use geolocate_api::GeolocateApi;

/// trait that defines how a single position fix is obtained
pub trait GeolocationProvider {
    /// Request one fix honoring the accuracy, timeout and cache age options
    fn current_position(&self, options: &FixOptions) -> Result<Fix, GeolocationError>;
}

pub fn new_geolocation_handler(
    config: &ServiceConfig,
) -> Result<Box<dyn GeolocationProvider>, Error> {
    match config.handler() {
        "fixed" => Ok(Box::new(FixedPosition::from_config(config)?)),
        "geolocate_api" => Ok(Box::new(GeolocateApi::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no geolocation handler exists for: {}",
            config.handler()
        ))),
    }
}
