//! Locate this host using a network geolocation service that speaks the Mozilla Location
//! Service geolocate API (BeaconDB, Google Geolocation, etc.)
use super::GeolocationProvider;
use crate::{
    config::{FromServiceConfig, ServiceConfig},
    geolocation::{Fix, FixOptions, GeolocationError},
    Error,
};
use log::{debug, trace};
use reqwest::{blocking::Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeolocateRequest {
    consider_ip: bool,
}

#[derive(Debug, Deserialize)]
struct ResponseLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GeolocateResponse {
    location: ResponseLocation,
    accuracy: Option<f64>,
}

impl From<GeolocateResponse> for Fix {
    fn from(resp: GeolocateResponse) -> Self {
        let mut fix = Fix::new(resp.location.lat, resp.location.lng, None);
        fix.accuracy = resp.accuracy;
        fix
    }
}

/// Connection parameters for a geolocate API endpoint. The service never reports altitude.
#[derive(Debug, FromServiceConfig)]
pub struct GeolocateApi {
    base_url: String,
    #[service_config(skip)]
    api_version: &'static str,
    api_key: String,
    consider_ip: bool,
    #[service_config(skip)]
    last_fix: RefCell<Option<(Instant, Fix)>>,
}

impl GeolocateApi {
    pub fn new(base_url: String, api_key: String, consider_ip: bool) -> Self {
        GeolocateApi {
            base_url,
            api_version: "v1",
            api_key,
            consider_ip,
            last_fix: RefCell::new(None),
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/{}/geolocate",
            self.base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    /// Previous fix if it is no older than `max_age_ms`
    fn cached_fix(&self, max_age_ms: u64) -> Option<Fix> {
        if max_age_ms == 0 {
            return None;
        }
        match *self.last_fix.borrow() {
            Some((taken, fix)) if taken.elapsed() <= Duration::from_millis(max_age_ms) => Some(fix),
            _ => None,
        }
    }

    fn request_fix(&self, options: &FixOptions) -> Result<Fix, Error> {
        let timeout = if options.timeout_ms > 0 {
            Some(Duration::from_millis(options.timeout_ms))
        } else {
            None // zero waits as long as the service takes
        };
        if options.high_accuracy {
            trace!("geolocate API has no high accuracy mode, requesting the default fix");
        }

        let client = Client::builder().timeout(timeout).build()?;
        let mut request = client.post(&self.request_url()).json(&GeolocateRequest {
            consider_ip: self.consider_ip,
        });
        if !self.api_key.is_empty() {
            request = request.query(&[("key", &self.api_key)]);
        }

        let resp = request.send()?;
        if resp.status().is_success() {
            let json: GeolocateResponse = resp.json()?;
            Ok(json.into())
        } else {
            let code = resp.status();
            let body = resp.text().unwrap_or_default();
            Err(Error::RequestError(code, body))
        }
    }
}

impl Default for GeolocateApi {
    fn default() -> Self {
        GeolocateApi::new(
            "https://api.beacondb.net".to_string(),
            String::new(),
            true,
        )
    }
}

/// Reduce a failed request to the reasons a position request can fail
fn classify_error(err: &Error) -> GeolocationError {
    match err {
        Error::Request(e) if e.is_timeout() => GeolocationError::Timeout,
        Error::RequestError(code, _) => classify_status(*code),
        _ => GeolocationError::PositionUnavailable,
    }
}

fn classify_status(code: StatusCode) -> GeolocationError {
    match code {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeolocationError::PermissionDenied,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GeolocationError::Timeout,
        _ => GeolocationError::PositionUnavailable,
    }
}

impl GeolocationProvider for GeolocateApi {
    fn current_position(&self, options: &FixOptions) -> Result<Fix, GeolocationError> {
        if let Some(fix) = self.cached_fix(options.max_fix_age_ms) {
            debug!("Reusing cached position fix: {:?}", fix);
            return Ok(fix);
        }

        debug!("Requesting position fix from: {}", self.request_url());
        let fix = self.request_fix(options).map_err(|e| {
            debug!("Position request failed: {}", e);
            classify_error(&e)
        })?;
        *self.last_fix.borrow_mut() = Some((Instant::now(), fix));
        Ok(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceParameters;
    use serde_yaml::Value;

    #[test]
    fn test_from_config() {
        let mut params = ServiceParameters::new();
        params.insert("base_url".to_string(), Value::from("http://localhost:8000/"));
        params.insert("api_key".to_string(), Value::from("secret"));
        params.insert("consider_ip".to_string(), Value::from(false));
        let api = GeolocateApi::from_config(&ServiceConfig::new(
            "geolocate_api".to_string(),
            params,
        ))
        .unwrap();
        assert_eq!(api.request_url(), "http://localhost:8000/v1/geolocate");
        assert_eq!(api.api_key, "secret");
        assert!(!api.consider_ip);
    }

    #[test]
    fn test_default_endpoint() {
        let api = GeolocateApi::default();
        assert_eq!(api.request_url(), "https://api.beacondb.net/v1/geolocate");
        assert!(api.consider_ip);
    }

    #[test]
    fn test_response_to_fix() {
        // JSON is valid YAML so the response body can be checked without a server
        let resp: GeolocateResponse = serde_yaml::from_str(
            r#"{"location": {"lat": 51.0, "lng": -0.1}, "accuracy": 600.0}"#,
        )
        .unwrap();
        let fix = Fix::from(resp);
        assert_eq!(fix.latitude, 51.0);
        assert_eq!(fix.longitude, -0.1);
        assert_eq!(fix.altitude, None);
        assert_eq!(fix.accuracy, Some(600.0));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            GeolocationError::PermissionDenied
        );
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            GeolocationError::PermissionDenied
        );
        assert_eq!(
            classify_status(StatusCode::GATEWAY_TIMEOUT),
            GeolocationError::Timeout
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            GeolocationError::PositionUnavailable
        );
        assert_eq!(
            classify_error(&Error::Other("boom".to_string())),
            GeolocationError::PositionUnavailable
        );
    }

    #[test]
    fn test_recent_fix_is_reused() {
        let api = GeolocateApi::new("http://127.0.0.1:9".to_string(), String::new(), true);
        let cached = Fix::new(39.5, -80.25, None);
        *api.last_fix.borrow_mut() = Some((Instant::now(), cached));
        let options = FixOptions {
            max_fix_age_ms: 60_000,
            ..FixOptions::default()
        };
        assert_eq!(api.current_position(&options), Ok(cached));
        assert_eq!(api.cached_fix(0), None);
    }
}
