//! Access elevation data for a given GPS location using an external source
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::gps::Location;
use crate::Error;
mod opentopodata;
pub use opentopodata::OpenTopoData;

/// trait that defines how elevation data should be added for an array of lat, long coordintes
pub trait ElevationDataSource {
    /// Updates the array of locations with elevation data
    fn request_elevation_data(
        &self,
        locations: &mut [Location],
    ) -> Result<(), Box<dyn std::error::Error>>;
}

pub fn new_elevation_handler(config: &ServiceConfig) -> Result<Box<dyn ElevationDataSource>, Error> {
    match config.handler() {
        "opentopodata" => Ok(Box::new(OpenTopoData::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no elevation handler exists for: {}",
            config.handler()
        ))),
    }
}
