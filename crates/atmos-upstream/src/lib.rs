#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod forecast;
mod location;
mod service;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use forecast::{Coordinates, ForecastKind, ForecastRequest};
pub use location::LocationRecord;
pub use service::{ForecastService, LocationService};

/// Tracing target for upstream operations.
pub const TRACING_TARGET: &str = "atmos_upstream";

/// Resolves a location name to a canonical [`LocationRecord`].
///
/// Implement this trait to plug in a geocoding backend.
#[async_trait::async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolves `name`, returning `None` when the backend knows no such place.
    async fn resolve(&self, name: &str) -> Result<Option<LocationRecord>>;
}

/// Fetches forecast data for a resolved location.
#[async_trait::async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetches data for the request, returning `None` when there is nothing to report.
    async fn fetch(&self, request: &ForecastRequest) -> Result<Option<serde_json::Value>>;
}
