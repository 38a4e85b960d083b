//! Canonical location record produced by a [`LocationResolver`].
//!
//! [`LocationResolver`]: crate::LocationResolver

use serde::{Deserialize, Serialize};

use crate::Coordinates;

/// A resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Stable identifier assigned by the resolver.
    pub location_id: String,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// IANA timezone name, e.g. `Asia/Bangkok`.
    pub timezone: String,
}

impl LocationRecord {
    /// Creates a new location record.
    pub fn new(
        location_id: impl Into<String>,
        longitude: f64,
        latitude: f64,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            longitude,
            latitude,
            timezone: timezone.into(),
        }
    }

    /// Returns the coordinates used by forecast providers.
    ///
    /// `timezone_override` replaces the record's own timezone when present.
    pub fn coordinates(&self, timezone_override: Option<&str>) -> Coordinates {
        Coordinates {
            long: self.longitude,
            lat: self.latitude,
            tz: timezone_override.unwrap_or(&self.timezone).to_owned(),
        }
    }
}
