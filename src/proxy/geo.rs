//! Geolocation of a proxy's egress address via an HTTP lookup service

use crate::error::CheckError;
use serde::Deserialize;

/// Default geolocation endpoint, queried through the proxy under test
pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com/json";

/// Geographic location reported by the lookup service
///
/// Only the country is consumed; every other field the service sends
/// (city, ISP, coordinates, ...) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct GeoLocation {
    /// Country name in English
    #[serde(default)]
    pub country: Option<String>,
}

impl GeoLocation {
    /// Decode a lookup response body
    pub fn from_body(body: &[u8]) -> Result<Self, CheckError> {
        let location: GeoLocation = serde_json::from_slice(body)?;
        Ok(location)
    }

    /// Country name, if the service reported a non-empty one
    pub fn country_name(&self) -> Option<&str> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
