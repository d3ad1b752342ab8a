//! Geolocation for new records.
//!
//! The [`LocationFeed`] caches the most recent fix reported by a
//! [`LocationProvider`] so that a save never waits on a fresh reading.

mod feed;
mod provider;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use feed::{LocationFeed, DEFAULT_CHANNEL_CAPACITY};
pub use provider::{
    FixedLocationProvider, LocationError, LocationProvider, PermissionStatus,
    PushLocationProvider,
};

/// A geographic position in decimal degrees.
///
/// The default value `(0, 0)` stands in for "no fix has been received".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components lie within their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Whether this is the `(0, 0)` placeholder.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    /// Parse `"LAT,LNG"`, tolerating whitespace around either component.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| Error::invalid_coordinate(s))?;
        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|_| Error::invalid_coordinate(s))?;
        let longitude: f64 = lng
            .trim()
            .parse()
            .map_err(|_| Error::invalid_coordinate(s))?;

        let coordinate = Self::new(latitude, longitude);
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(Error::invalid_coordinate(s))
        }
    }
}
