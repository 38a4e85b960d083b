//! Quick-retrieve location lookup.

use atmos_upstream::{LocationRecord, LocationService};
use axum::extract::FromRef;

use super::{CacheLookup, LocationCache, LocationToken, ServiceState};
use crate::worker::RevalidationSignal;
use crate::{Error, Result};

/// Tracing target for quick-retrieve lookups.
const TRACING_TARGET_LOOKUP: &str = "atmos_server::service::lookup";

/// Where a [`ResolvedLocation`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSource {
    /// Read from the cache under the quick-retrieve token.
    Cache,
    /// Resolved by name.
    Resolver { query: String },
}

/// A location together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub record: LocationRecord,
    pub source: LocationSource,
}

impl ResolvedLocation {
    /// Returns `true` if the record was served from the cache.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self.source, LocationSource::Cache)
    }
}

/// Resolves a location from a quick-retrieve token, falling back to the
/// location name.
///
/// The cache is only read while the health monitor reports it healthy. A
/// failed or slow read never fails the lookup: it falls back to the resolver.
#[derive(Debug, Clone)]
pub struct QuickRetrieve {
    cache: LocationCache,
    locations: LocationService,
    signal: RevalidationSignal,
}

impl QuickRetrieve {
    /// Creates a new lookup.
    pub fn new(
        cache: LocationCache,
        locations: LocationService,
        signal: RevalidationSignal,
    ) -> Self {
        Self {
            cache,
            locations,
            signal,
        }
    }

    /// Looks up a location by `token`, or by `name` when the cache cannot
    /// answer.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::LocationNotFound`] when there is no cache hit and
    /// the name is absent, empty, unknown to the resolver, or the resolver
    /// call fails.
    ///
    /// [`ErrorKind::LocationNotFound`]: crate::ErrorKind::LocationNotFound
    #[tracing::instrument(skip(self), target = TRACING_TARGET_LOOKUP)]
    pub async fn lookup(
        &self,
        token: Option<&str>,
        name: Option<&str>,
    ) -> Result<ResolvedLocation> {
        if let Some(token) = self.parse_token(token)
            && let Some(record) = self.read_cache(&token).await
        {
            return Ok(ResolvedLocation {
                record,
                source: LocationSource::Cache,
            });
        }

        self.resolve_name(name).await
    }

    /// Writes a resolver result back so its `locationId` can be used as the
    /// next quick-retrieve token. Cache hits are not rewritten.
    pub async fn remember(&self, resolved: &ResolvedLocation) -> bool {
        match &resolved.source {
            LocationSource::Cache => false,
            LocationSource::Resolver { query } => {
                self.cache.remember(query, &resolved.record).await
            }
        }
    }

    fn parse_token(&self, token: Option<&str>) -> Option<LocationToken> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        match LocationToken::new(token) {
            Ok(token) => Some(token),
            Err(error) => {
                tracing::debug!(
                    target: TRACING_TARGET_LOOKUP,
                    error = %error,
                    "Ignoring malformed quick-retrieve token"
                );
                None
            }
        }
    }

    async fn read_cache(&self, token: &LocationToken) -> Option<LocationRecord> {
        if !self.cache.is_trusted() {
            tracing::debug!(
                target: TRACING_TARGET_LOOKUP,
                token = %token,
                "Cache untrusted, resolving by name"
            );
            return None;
        }

        match self.cache.lookup(token).await {
            Ok(CacheLookup::Hit(entry)) => {
                tracing::debug!(
                    target: TRACING_TARGET_LOOKUP,
                    token = %token,
                    location_id = %entry.record.location_id,
                    "Quick-retrieve hit"
                );
                Some(entry.record)
            }
            Ok(CacheLookup::Expired(_)) => {
                let queued = self.signal.request(token.clone());
                tracing::debug!(
                    target: TRACING_TARGET_LOOKUP,
                    token = %token,
                    revalidation_queued = queued,
                    "Quick-retrieve entry expired"
                );
                None
            }
            Ok(CacheLookup::Miss) => None,
            // Already reported to the health monitor by the cache; a full
            // cycle is how trust gets restored.
            Err(_) => {
                let queued = self.signal.revalidate_all();
                tracing::debug!(
                    target: TRACING_TARGET_LOOKUP,
                    token = %token,
                    revalidation_queued = queued,
                    "Cache read failed, resolving by name"
                );
                None
            }
        }
    }

    async fn resolve_name(&self, name: Option<&str>) -> Result<ResolvedLocation> {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Err(Error::location_not_found("no cached location and no name"));
        };

        match self.locations.resolve(name).await {
            Ok(Some(record)) => Ok(ResolvedLocation {
                record,
                source: LocationSource::Resolver {
                    query: name.to_owned(),
                },
            }),
            Ok(None) => Err(Error::location_not_found(format!(
                "no location named '{name}'"
            ))),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_LOOKUP,
                    location_name = name,
                    error = %error,
                    "Location resolution failed"
                );
                Err(Error::location_not_found(format!("could not resolve '{name}'"))
                    .with_source(error))
            }
        }
    }
}

impl FromRef<ServiceState> for QuickRetrieve {
    fn from_ref(state: &ServiceState) -> Self {
        Self::new(
            state.location_cache.clone(),
            state.location_service.clone(),
            state.revalidation.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ErrorKind;
    use crate::service::testing::{InstrumentedStore, TestHarness, bangkok, bkk};
    use crate::service::{CacheStore, CachedLocation};

    fn lookup(harness: &TestHarness) -> QuickRetrieve {
        QuickRetrieve::from_ref(&harness.state())
    }

    #[tokio::test]
    async fn healthy_cache_hit_skips_resolver() {
        let harness = TestHarness::new();
        harness.store.seed("abc123", "Bangkok", bkk()).await;
        harness.health.report_healthy();

        let resolved = lookup(&harness)
            .lookup(Some("abc123"), Some("Bangkok"))
            .await
            .unwrap();

        assert_eq!(resolved.record.location_id, "BKK");
        assert!(resolved.is_cached());
        assert_eq!(harness.resolver.calls(), 0);
        assert_eq!(harness.store.gets(), 1);
    }

    #[tokio::test]
    async fn unhealthy_cache_is_never_read() {
        let harness = TestHarness::new();
        harness.store.seed("abc123", "Bangkok", bkk()).await;

        let resolved = lookup(&harness)
            .lookup(Some("abc123"), Some("Bangkok"))
            .await
            .unwrap();

        assert_eq!(resolved.record, bangkok());
        assert_eq!(harness.resolver.calls(), 1);
        assert_eq!(harness.store.gets(), 0);
    }

    #[tokio::test]
    async fn missing_entry_falls_back_to_name() {
        let harness = TestHarness::new();
        harness.health.report_healthy();

        let resolved = lookup(&harness)
            .lookup(Some("unknown"), Some("Bangkok"))
            .await
            .unwrap();

        assert_eq!(
            resolved.source,
            LocationSource::Resolver {
                query: "Bangkok".to_owned()
            }
        );
        assert_eq!(harness.store.gets(), 1);
    }

    #[tokio::test]
    async fn empty_name_without_cache_is_not_found() {
        let harness = TestHarness::new();
        harness.health.report_healthy();
        let lookup = lookup(&harness);

        for (token, name) in [(None, Some("")), (Some(""), None), (None, Some("   "))] {
            let error = lookup.lookup(token, name).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::LocationNotFound);
        }
        assert_eq!(harness.resolver.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let harness = TestHarness::new();
        let error = lookup(&harness)
            .lookup(None, Some("Atlantis"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::LocationNotFound);
    }

    #[tokio::test]
    async fn resolver_failure_is_not_found() {
        let harness = TestHarness::new();
        harness.resolver.set_failing(true);

        let error = lookup(&harness)
            .lookup(None, Some("Bangkok"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::LocationNotFound);
        assert_eq!(harness.resolver.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_token_uses_name() {
        let harness = TestHarness::new();
        harness.health.report_healthy();

        let resolved = lookup(&harness)
            .lookup(Some("location:abc"), Some("Bangkok"))
            .await
            .unwrap();

        assert!(!resolved.is_cached());
        assert_eq!(harness.store.gets(), 0);
    }

    #[tokio::test]
    async fn failing_store_flips_health_and_falls_back() {
        let harness = TestHarness::new();
        harness.health.report_healthy();
        harness.store.set_failing(true);

        let resolved = lookup(&harness)
            .lookup(Some("abc123"), Some("Bangkok"))
            .await
            .unwrap();

        assert_eq!(resolved.record, bangkok());
        assert!(!harness.health.is_healthy());
    }

    #[tokio::test]
    async fn failed_cache_read_requests_full_cycle() {
        let harness = TestHarness::new();
        harness.health.report_healthy();
        harness.store.set_failing(true);

        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let lookup = QuickRetrieve::new(
            harness.cache(),
            harness.state().location_service,
            RevalidationSignal::new(tx),
        );

        let resolved = lookup
            .lookup(Some("abc123"), Some("Bangkok"))
            .await
            .unwrap();

        assert!(!resolved.is_cached());
        assert_eq!(
            rx.recv().await,
            Some(crate::worker::WorkerCommand::RevalidateAll)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_falls_back_within_bound() {
        let store = InstrumentedStore::new().with_delay(Duration::from_secs(5));
        let harness = TestHarness::new().with_store(store);
        harness.store.seed("abc123", "Bangkok", bkk()).await;
        harness.health.report_healthy();

        let started = tokio::time::Instant::now();
        let resolved = lookup(&harness)
            .lookup(Some("abc123"), Some("Bangkok"))
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(resolved.record, bangkok());
        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_secs(1));
        assert!(!harness.health.is_healthy());
    }

    #[tokio::test]
    async fn expired_entry_requests_revalidation() {
        let harness = TestHarness::new();
        harness.health.report_healthy();
        let token = LocationToken::new("abc123").unwrap();
        let expired = CachedLocation::new("Bangkok", bkk(), Duration::ZERO);
        harness
            .store
            .memory()
            .set(&token, &expired, Duration::from_secs(60))
            .await
            .unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let lookup = QuickRetrieve::new(
            harness.cache(),
            harness.state().location_service,
            RevalidationSignal::new(tx),
        );

        let resolved = lookup
            .lookup(Some("abc123"), Some("Bangkok"))
            .await
            .unwrap();

        assert_eq!(resolved.record, bangkok());
        assert_eq!(
            rx.recv().await,
            Some(crate::worker::WorkerCommand::Revalidate(vec![token]))
        );
    }

    #[tokio::test]
    async fn resolver_results_are_written_through() {
        let harness = TestHarness::new();
        harness.health.report_healthy();
        let lookup = lookup(&harness);

        let resolved = lookup.lookup(None, Some("Bangkok")).await.unwrap();
        assert!(lookup.remember(&resolved).await);

        let again = lookup
            .lookup(Some("1609350"), Some("Bangkok"))
            .await
            .unwrap();
        assert!(again.is_cached());
        assert!(!lookup.remember(&again).await);
        assert_eq!(harness.resolver.calls(), 1);
        assert_eq!(harness.store.sets(), 1);
    }
}
