//! Health-gated access to the cache store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use atmos_upstream::LocationRecord;

use super::store::bounded;
use super::{CacheStore, CachedLocation, ConnectivityError, LocationToken};
use crate::service::HealthMonitor;

/// Tracing target for location cache operations.
const TRACING_TARGET_LOCATION_CACHE: &str = "atmos_server::service::cache";

/// Default bound on a single request-path cache operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(250);

/// Default lifetime of a cached location.
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(60 * 60);

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A live entry.
    Hit(CachedLocation),
    /// An entry whose deadline has passed; callers treat it as absent.
    Expired(CachedLocation),
    /// Nothing usable is stored under the key.
    Miss,
}

/// Cache store wrapper that bounds every request-path operation and reports
/// connectivity failures to the [`HealthMonitor`].
#[derive(Clone)]
pub struct LocationCache {
    store: Arc<dyn CacheStore>,
    health: HealthMonitor,
    operation_timeout: Duration,
    ttl: Duration,
}

impl fmt::Debug for LocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationCache")
            .field("backend", &self.store.backend())
            .field("operation_timeout", &self.operation_timeout)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl LocationCache {
    /// Creates a cache over `store` with default bounds.
    pub fn new<S>(store: S, health: HealthMonitor) -> Self
    where
        S: CacheStore + 'static,
    {
        Self::from_arc(Arc::new(store), health)
    }

    /// Creates a cache over a shared store with default bounds.
    pub fn from_arc(store: Arc<dyn CacheStore>, health: HealthMonitor) -> Self {
        Self {
            store,
            health,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            ttl: DEFAULT_ENTRY_TTL,
        }
    }

    /// Sets the bound on each request-path cache operation.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Sets the lifetime of newly written entries.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the underlying store.
    #[inline]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Returns the health monitor gating this cache.
    #[inline]
    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Returns the lifetime of newly written entries.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the bound on each request-path operation.
    #[inline]
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Returns `true` if cached reads may currently be trusted.
    #[inline]
    pub fn is_trusted(&self) -> bool {
        self.health.is_healthy()
    }

    /// Reads the entry for `token`.
    ///
    /// Does not consult the health monitor; callers check [`is_trusted`] first.
    /// Any failure, timeouts included, marks the cache unhealthy.
    ///
    /// [`is_trusted`]: Self::is_trusted
    #[tracing::instrument(skip(self, token), fields(token = %token), target = TRACING_TARGET_LOCATION_CACHE)]
    pub async fn lookup(&self, token: &LocationToken) -> Result<CacheLookup, ConnectivityError> {
        let result = bounded("get", self.operation_timeout, self.store.get(token)).await;

        let entry = match result {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(CacheLookup::Miss),
            Err(error) => {
                self.report_failure(&error);
                return Err(error);
            }
        };

        if !entry.is_current_version() {
            tracing::debug!(
                target: TRACING_TARGET_LOCATION_CACHE,
                version = entry.version,
                "Cache entry has an unknown layout version"
            );
            return Ok(CacheLookup::Miss);
        }

        if entry.is_expired() {
            return Ok(CacheLookup::Expired(entry));
        }

        Ok(CacheLookup::Hit(entry))
    }

    /// Stores a freshly resolved record under `location:<locationId>`.
    ///
    /// Skipped while the cache is untrusted. Returns `true` if the entry was
    /// written.
    #[tracing::instrument(skip(self, record), fields(location_id = %record.location_id), target = TRACING_TARGET_LOCATION_CACHE)]
    pub async fn remember(&self, query: &str, record: &LocationRecord) -> bool {
        if !self.is_trusted() {
            return false;
        }

        let token = match LocationToken::new(record.location_id.as_str()) {
            Ok(token) => token,
            Err(error) => {
                tracing::debug!(
                    target: TRACING_TARGET_LOCATION_CACHE,
                    error = %error,
                    "Location id is not usable as a quick-retrieve token"
                );
                return false;
            }
        };

        let entry = CachedLocation::new(query, record.clone(), self.ttl);
        let result = bounded(
            "set",
            self.operation_timeout,
            self.store.set(&token, &entry, self.ttl),
        )
        .await;

        match result {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET_LOCATION_CACHE,
                    key = %token.cache_key(),
                    "Location cached"
                );
                true
            }
            Err(error) => {
                self.report_failure(&error);
                false
            }
        }
    }

    fn report_failure(&self, error: &ConnectivityError) {
        tracing::warn!(
            target: TRACING_TARGET_LOCATION_CACHE,
            backend = self.store.backend(),
            operation = error.operation,
            timed_out = error.timed_out,
            reason = %error.reason,
            "Cache store unreachable"
        );
        self.health.report_unhealthy();
    }
}
