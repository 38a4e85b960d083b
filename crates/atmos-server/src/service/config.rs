//! Service layer configuration.

use std::sync::Arc;
use std::time::Duration;

use atmos_nats::{NatsClient, NatsConfig};
use atmos_upstream::reqwest::{OpenMeteoClient, UpstreamConfig};
#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::service::{CacheStore, MemoryCacheStore, NatsCacheStore};
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Default lifetime of a cached location in seconds.
    pub const CACHE_TTL_SECS: u64 = 60 * 60;

    /// Default bound on a request-path cache operation in milliseconds.
    pub const CACHE_TIMEOUT_MS: u64 = 250;
}

/// Which cache store backs the location cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheBackend {
    /// JetStream KV bucket on the configured NATS server.
    #[default]
    Nats,
    /// Process-local map, lost on restart.
    Memory,
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Cache store backend
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CACHE_BACKEND", value_enum, default_value_t = CacheBackend::Nats)
    )]
    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// Lifetime of a cached location in seconds
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CACHE_TTL_SECS", default_value_t = defaults::CACHE_TTL_SECS)
    )]
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on a single cache operation on the request path, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CACHE_TIMEOUT_MS", default_value_t = defaults::CACHE_TIMEOUT_MS)
    )]
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,

    /// NATS connection used by the `nats` cache backend.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub nats: NatsConfig,

    /// Geocoding, forecast and air-quality endpoints.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

fn default_cache_ttl_secs() -> u64 {
    defaults::CACHE_TTL_SECS
}

fn default_cache_timeout_ms() -> u64 {
    defaults::CACHE_TIMEOUT_MS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_backend: CacheBackend::default(),
            cache_ttl_secs: defaults::CACHE_TTL_SECS,
            cache_timeout_ms: defaults::CACHE_TIMEOUT_MS,
            nats: NatsConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Returns the lifetime of a cached location.
    #[inline]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns the bound on a request-path cache operation.
    #[inline]
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Validates all configuration values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if:
    /// - the cache TTL or cache timeout is zero
    /// - the NATS settings are invalid while the `nats` backend is selected
    /// - any upstream URL is invalid
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(Error::config("Cache TTL must be greater than 0"));
        }

        if self.cache_timeout_ms == 0 {
            return Err(Error::config("Cache timeout must be greater than 0"));
        }

        if self.cache_backend == CacheBackend::Nats {
            self.nats.validate().map_err(Error::config)?;
        }

        self.upstream.validate().map_err(Error::config)?;

        Ok(())
    }

    /// Creates the configured cache store, connecting to NATS if needed.
    pub async fn connect_cache_store(&self) -> Result<Arc<dyn CacheStore>> {
        match self.cache_backend {
            CacheBackend::Memory => Ok(Arc::new(MemoryCacheStore::new())),
            CacheBackend::Nats => {
                let client = NatsClient::connect(self.nats.clone()).await.map_err(|e| {
                    Error::internal("nats", "Failed to connect to NATS").with_source(e)
                })?;
                Ok(Arc::new(NatsCacheStore::new(client, self.cache_ttl())))
            }
        }
    }

    /// Creates the Open-Meteo client used for resolution and forecasts.
    pub fn create_upstream_client(&self) -> Result<OpenMeteoClient> {
        OpenMeteoClient::new(self.upstream.clone()).map_err(|e| {
            Error::config("Failed to create upstream client").with_source(e)
        })
    }
}
