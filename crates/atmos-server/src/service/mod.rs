//! Application state and dependency injection.

mod cache;
mod config;
mod health;
mod lookup;

#[cfg(test)]
pub(crate) mod testing;

use atmos_upstream::{ForecastKind, ForecastService, LocationService};

pub(crate) use crate::service::cache::bounded;
pub use crate::service::cache::{
    CACHE_ENTRY_VERSION, CacheLookup, CacheStore, CachedLocation, ConnectivityError,
    DEFAULT_ENTRY_TTL, DEFAULT_OPERATION_TIMEOUT, InvalidToken, LOCATION_KEY_PREFIX,
    LocationCache, LocationToken, MAX_TOKEN_LEN, MemoryCacheStore, NatsCacheStore,
};
pub use crate::service::config::{CacheBackend, ServiceConfig};
pub use crate::service::health::{HealthMonitor, HealthSnapshot};
pub use crate::service::lookup::{LocationSource, QuickRetrieve, ResolvedLocation};
use crate::worker::RevalidationSignal;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Tracing target for state initialization.
const TRACING_TARGET: &str = "atmos_server::service";

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    // External services:
    pub location_service: LocationService,
    pub weather: ForecastService,
    pub air_quality: ForecastService,

    // Internal services:
    pub health: HealthMonitor,
    pub location_cache: LocationCache,
    pub revalidation: RevalidationSignal,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects the cache store and creates the upstream clients. The health
    /// monitor starts unhealthy; the revalidation worker is not connected
    /// until [`with_revalidation`] is called.
    ///
    /// [`with_revalidation`]: Self::with_revalidation
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        let health = HealthMonitor::new();
        let store = service_config.connect_cache_store().await?;
        let location_cache = LocationCache::from_arc(store, health.clone())
            .with_operation_timeout(service_config.cache_timeout())
            .with_ttl(service_config.cache_ttl());

        let upstream = service_config.create_upstream_client()?;

        tracing::info!(
            target: TRACING_TARGET,
            cache_backend = %service_config.cache_backend,
            cache_ttl_secs = service_config.cache_ttl_secs,
            cache_timeout_ms = service_config.cache_timeout_ms,
            "Service state initialized"
        );

        Ok(Self::new(
            health,
            location_cache,
            upstream.clone().into_location_service(),
            upstream.clone().into_weather_service(),
            upstream.into_air_quality_service(),
        ))
    }

    /// Assembles state from already constructed services.
    pub fn new(
        health: HealthMonitor,
        location_cache: LocationCache,
        location_service: LocationService,
        weather: ForecastService,
        air_quality: ForecastService,
    ) -> Self {
        Self {
            location_service,
            weather,
            air_quality,
            health,
            location_cache,
            revalidation: RevalidationSignal::disconnected(),
        }
    }

    /// Connects request handlers to the revalidation worker.
    pub fn with_revalidation(mut self, signal: RevalidationSignal) -> Self {
        self.revalidation = signal;
        self
    }

    /// Returns the forecast service for `kind`.
    pub fn forecast(&self, kind: ForecastKind) -> &ForecastService {
        match kind {
            ForecastKind::Weather => &self.weather,
            ForecastKind::AirQuality => &self.air_quality,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(location_service: LocationService);

// Internal services:
impl_di!(health: HealthMonitor);
impl_di!(location_cache: LocationCache);
impl_di!(revalidation: RevalidationSignal);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::TestHarness;

    #[test]
    fn forecast_selects_service_by_kind() {
        let state = TestHarness::new().state();
        assert_eq!(state.forecast(ForecastKind::Weather).kind(), ForecastKind::Weather);
        assert_eq!(
            state.forecast(ForecastKind::AirQuality).kind(),
            ForecastKind::AirQuality
        );
        assert!(!state.revalidation.is_connected());
    }

    #[tokio::test]
    async fn memory_backend_state_from_config() {
        let config = ServiceConfig {
            cache_backend: CacheBackend::Memory,
            ..ServiceConfig::default()
        };

        let state = ServiceState::from_config(&config).await.unwrap();
        assert_eq!(state.location_cache.store().backend(), "memory");
        assert!(!state.health.is_healthy());
    }
}
