//! Look up elevation data based on lat, long coordintes using the opentopodata API
use super::ElevationDataSource;
use crate::{
    config::{FromServiceConfig, ServiceConfig},
    gps::Location,
    Error,
};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::{thread, time};

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct Elevation {
    elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    results: Vec<Elevation>,
}

/// Defines the connection parameters to reqest elevation data from an instance of opentopodata
#[derive(Clone, Debug, FromServiceConfig)]
pub struct OpenTopoData {
    base_url: String,
    #[service_config(skip)]
    api_version: &'static str,
    dataset: String,
    batch_size: usize,
    requests_per_sec: f32,
}

impl OpenTopoData {
    /// Create a new data source that uses the OpenTopoData version 1 API
    pub fn new(
        base_url: String,
        dataset: String,
        batch_size: usize,
        requests_per_sec: f32,
    ) -> Self {
        OpenTopoData {
            base_url,
            api_version: "v1",
            dataset,
            batch_size,
            requests_per_sec,
        }
    }

    fn request_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, self.dataset)
    }

    fn location_param(locations: &[Location]) -> String {
        locations
            .iter()
            .map(|l| format!("{0:.6},{1:.6}", l.latitude(), l.longitude()))
            .collect::<Vec<String>>()
            .join("|")
    }
}

impl Default for OpenTopoData {
    fn default() -> Self {
        OpenTopoData {
            base_url: "https://api.opentopodata.org".to_string(),
            api_version: "v1",
            dataset: "srtm30m".to_string(),
            batch_size: 100,
            requests_per_sec: 1.0, // public instance limit
        }
    }
}

impl ElevationDataSource for OpenTopoData {
    fn request_elevation_data(
        &self,
        locations: &mut [Location],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let request_url = self.request_url();
        let delay = if self.requests_per_sec > 0.0 {
            (1.0e6 / self.requests_per_sec) as u64 // store as micro seconds
        } else {
            0 // treat zero as if a limit wasn't imposed to prevent subtle runtime error
        };
        let delay = time::Duration::from_micros(delay);

        // create client and start fetching data in batches
        let client = Client::new();
        for (i, chunk) in locations.chunks_mut(self.batch_size.max(1)).enumerate() {
            if i > 0 {
                thread::sleep(delay);
            }
            let resp = client
                .get(&request_url)
                .query(&[("locations", Self::location_param(chunk))])
                .send()?;
            if resp.status().is_success() {
                let json: SuccessResponse = resp.json()?;
                for (loc, elevation) in chunk
                    .iter_mut()
                    .zip(json.results.into_iter().map(|r| r.elevation))
                {
                    loc.set_elevation(elevation);
                }
            } else {
                // parse error response to get reason why the request failed
                let code = resp.status();
                let json: ErrorResponse = resp.json()?;
                return Err(Box::new(Error::RequestError(code, json.error)));
            }
        }

        Ok(())
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
        params.insert("base_url".to_string(), Value::from("http://localhost:5000"));
        params.insert("dataset".to_string(), Value::from("ned10m"));
        params.insert("batch_size".to_string(), Value::from(50));
        let topo = OpenTopoData::from_config(&ServiceConfig::new(
            "opentopodata".to_string(),
            params,
        ))
        .unwrap();
        assert_eq!(topo.request_url(), "http://localhost:5000/v1/ned10m");
        assert_eq!(topo.batch_size, 50);
        assert_eq!(topo.requests_per_sec, 1.0);
    }

    #[test]
    fn test_location_param() {
        let locations = vec![Location::new(39.5, -80.25), Location::new(39.123456789, -80.1)];
        assert_eq!(
            OpenTopoData::location_param(&locations),
            "39.500000,-80.250000|39.123457,-80.100000"
        );
    }
}
