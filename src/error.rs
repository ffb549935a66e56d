//! Defines the general error type for the crate and various conversions into it
use crate::geolocation::GeolocationError;
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    GeoJson(geojson::Error),
    Geolocation(GeolocationError),
    Gpx(gpx::errors::GpxError),
    InvalidConfigurationValue(String),
    Io(std::io::Error),
    MappingUnavailable(String),
    Other(String),
    Request(reqwest::Error),
    RequestError(reqwest::StatusCode, String),
    UnknownServiceHandler(String),
    Yaml(serde_yaml::Error),
}

impl convert::From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Error {
        Error::GeoJson(err)
    }
}

impl convert::From<GeolocationError> for Error {
    fn from(err: GeolocationError) -> Error {
        Error::Geolocation(err)
    }
}

impl convert::From<gpx::errors::GpxError> for Error {
    fn from(err: gpx::errors::GpxError) -> Error {
        Error::Gpx(err)
    }
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl convert::From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Request(err)
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::Yaml(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::GeoJson(e) => write!(f, "Could not parse GeoJSON data: {}", e),
            Error::Geolocation(e) => write!(f, "Geolocation request failed: {}", e),
            Error::Gpx(e) => write!(f, "Could not parse GPX data: {}", e),
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::Io(e) => write!(f, "{}", e),
            Error::MappingUnavailable(msg) => write!(f, "Map rendering is unavailable: {}", msg),
            Error::Other(msg) => write!(f, "{}", msg),
            Error::Request(e) => write!(f, "{}", e),
            Error::RequestError(code, msg) => {
                write!(f, "Request failed with code: {} - {}", code, msg)
            }
            Error::UnknownServiceHandler(msg) => write!(f, "{}", msg),
            Error::Yaml(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
