//! Forecast request types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Geographic position and timezone passed to forecast providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Longitude in decimal degrees.
    pub long: f64,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// IANA timezone used to align hourly and daily series.
    pub tz: String,
}

/// A single forecast fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Whether intermediate HTTP caches may answer the request.
    pub use_cache: bool,
    /// Identifier of the resolved location.
    pub location_id: String,
    /// Where and in which timezone to fetch.
    pub coordinates: Coordinates,
}

impl ForecastRequest {
    /// Creates a cacheable request.
    pub fn new(location_id: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            use_cache: true,
            location_id: location_id.into(),
            coordinates,
        }
    }

    /// Sets whether intermediate caches may be used.
    #[must_use]
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

/// The kind of data a forecast provider serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ForecastKind {
    /// Current conditions plus hourly and daily weather.
    Weather,
    /// Current and hourly pollutant concentrations.
    AirQuality,
}
