//! Module with GPS specific structures

/// Mean earth radius in meters, matches the spherical model used by web map libraries
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Stores a single geospatial point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    /// latitude coordinate in degrees
    latitude: f64,
    /// longitude coordinate in degrees
    longitude: f64,
    /// elevation in meters if available
    elevation: Option<f64>,
}

impl Location {
    /// Create a location without elevation data from coordinates in degrees
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            latitude,
            longitude,
            elevation: None,
        }
    }

    /// Create a location with an optional elevation in meters
    pub fn with_elevation(latitude: f64, longitude: f64, elevation: Option<f64>) -> Self {
        Location {
            latitude,
            longitude,
            elevation,
        }
    }

    /// Return latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Return longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Return elevation in meters (if defined)
    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    /// Set elevation in meters
    pub fn set_elevation(&mut self, elevation: Option<f64>) {
        self.elevation = elevation;
    }

    /// Great-circle distance in meters to another location using the haversine formula.
    /// Elevation is ignored.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS * c
    }
}

/// Smallest latitude/longitude box containing a set of locations
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl BoundingBox {
    /// Compute the bounds of the provided locations, `None` if there are none
    pub fn from_locations<'a, I>(locations: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Location>,
    {
        let mut iter = locations.into_iter();
        let first = iter.next()?;
        let init = BoundingBox {
            min_lat: first.latitude(),
            max_lat: first.latitude(),
            min_lon: first.longitude(),
            max_lon: first.longitude(),
        };
        Some(iter.fold(init, |mut bbox, loc| {
            bbox.extend(loc);
            bbox
        }))
    }

    /// Grow the box so it contains the location
    pub fn extend(&mut self, location: &Location) {
        self.min_lat = self.min_lat.min(location.latitude());
        self.max_lat = self.max_lat.max(location.latitude());
        self.min_lon = self.min_lon.min(location.longitude());
        self.max_lon = self.max_lon.max(location.longitude());
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Midpoint of the box
    pub fn center(&self) -> Location {
        Location::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Encodes a slice of coordinates into Google Encoded Polyline format.
///
/// This code was extracted and simplified for our use case from:
/// https://github.com/georust/polyline
/// https://developers.google.com/maps/documentation/utilities/polylinealgorithm
pub fn encode_coordinates(coordinates: &[Location]) -> String {
    let mut output = String::new();
    let mut b = (0, 0);

    for a in coordinates {
        let a = (scale(a.latitude), scale(a.longitude));
        encode(a.0, b.0, &mut output);
        encode(a.1, b.1, &mut output);
        b = a;
    }

    output
}

/// Scale a floating point value into an integer at the given precision
#[inline]
fn scale(n: f64) -> i64 {
    static FACTOR: f64 = 100_000.0; // use 5 digits of precision
    (FACTOR * n).round() as i64
}

/// Encode a single latitude or longitude value into the polyline format
fn encode(current: i64, previous: i64, output: &mut String) {
    let mut coordinate = (current - previous) << 1;
    if (current - previous) < 0 {
        coordinate = !coordinate;
    }
    while coordinate >= 0x20 {
        output.push(char::from(((0x20 | (coordinate & 0x1f)) + 63) as u8));
        coordinate >>= 5;
    }
    output.push(char::from((coordinate + 63) as u8));
}
