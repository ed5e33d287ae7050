//! Location model for geographic coordinates and the user's resolved address

use serde::{Deserialize, Serialize};

/// A resolved latitude/longitude pair
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a new coordinate
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are finite and inside the WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// The user's home location for one conversational session.
///
/// Created once after geocoding succeeds and carried in the session
/// attributes between turns; never modified afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressContext {
    /// Address text as sent to the geocoder
    pub address: String,
    /// Geocoded position of `address`
    pub location: GeoCoordinate,
}

impl AddressContext {
    #[must_use]
    pub fn new(address: String, location: GeoCoordinate) -> Self {
        Self { address, location }
    }
}
