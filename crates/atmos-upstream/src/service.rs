//! Service wrappers with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    ForecastKind, ForecastProvider, ForecastRequest, LocationRecord, LocationResolver, Result,
    TRACING_TARGET,
};

/// Location resolver wrapper with observability.
///
/// The inner resolver is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct LocationService {
    inner: Arc<dyn LocationResolver>,
}

impl fmt::Debug for LocationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationService").finish_non_exhaustive()
    }
}

impl LocationService {
    /// Create a new location service wrapper.
    pub fn new<R>(resolver: R) -> Self
    where
        R: LocationResolver + 'static,
    {
        Self {
            inner: Arc::new(resolver),
        }
    }

    /// Resolves a location name.
    pub async fn resolve(&self, name: &str) -> Result<Option<LocationRecord>> {
        let started_at = Instant::now();
        let result = self.inner.resolve(name).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(Some(record)) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    name = %name,
                    location_id = %record.location_id,
                    elapsed_ms = elapsed.as_millis(),
                    "Location resolved"
                );
            }
            Ok(None) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    name = %name,
                    elapsed_ms = elapsed.as_millis(),
                    "Location not known to resolver"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    name = %name,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Location resolution failed"
                );
            }
        }

        result
    }
}

/// Forecast provider wrapper with observability.
#[derive(Clone)]
pub struct ForecastService {
    kind: ForecastKind,
    inner: Arc<dyn ForecastProvider>,
}

impl fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastService")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl ForecastService {
    /// Create a new forecast service wrapper.
    pub fn new<P>(kind: ForecastKind, provider: P) -> Self
    where
        P: ForecastProvider + 'static,
    {
        Self {
            kind,
            inner: Arc::new(provider),
        }
    }

    /// Returns which data this service fetches.
    #[inline]
    pub fn kind(&self) -> ForecastKind {
        self.kind
    }

    /// Fetches forecast data.
    pub async fn fetch(&self, request: &ForecastRequest) -> Result<Option<serde_json::Value>> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            kind = %self.kind,
            location_id = %request.location_id,
            tz = %request.coordinates.tz,
            use_cache = request.use_cache,
            "Fetching forecast"
        );

        let result = self.inner.fetch(request).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(data) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    kind = %self.kind,
                    location_id = %request.location_id,
                    has_data = data.is_some(),
                    elapsed_ms = elapsed.as_millis(),
                    "Forecast fetched"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    kind = %self.kind,
                    location_id = %request.location_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Forecast fetch failed"
                );
            }
        }

        result
    }
}
