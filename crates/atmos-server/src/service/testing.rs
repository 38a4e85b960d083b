//! Test doubles shared by service, worker and handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use atmos_upstream::{
    ForecastKind, ForecastProvider, ForecastRequest, ForecastService, LocationRecord,
    LocationResolver, LocationService,
};

use super::{
    CacheStore, CachedLocation, ConnectivityError, HealthMonitor, LocationCache, LocationToken,
    MemoryCacheStore, ServiceState,
};

/// Memory store that counts calls and can be made slow or unreachable.
#[derive(Debug, Clone, Default)]
pub struct InstrumentedStore {
    inner: MemoryCacheStore,
    gets: Arc<AtomicUsize>,
    sets: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    failing_gets: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes `get` fail for one token only.
    pub fn fail_get_for(&self, token: &str) {
        self.failing_gets.lock().unwrap().insert(token.to_owned());
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> &MemoryCacheStore {
        &self.inner
    }

    /// Writes directly to the backing memory store, bypassing counters.
    pub async fn seed(&self, token: &str, query: &str, record: LocationRecord) {
        let token = LocationToken::new(token).unwrap();
        let entry = CachedLocation::new(query, record, Duration::from_secs(3600));
        self.inner
            .set(&token, &entry, Duration::from_secs(3600))
            .await
            .unwrap();
    }

    async fn enter(&self, operation: &'static str) -> Result<(), ConnectivityError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConnectivityError::new(operation, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for InstrumentedStore {
    fn backend(&self) -> &'static str {
        "instrumented"
    }

    async fn get(
        &self,
        token: &LocationToken,
    ) -> Result<Option<CachedLocation>, ConnectivityError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.enter("get").await?;
        if self.failing_gets.lock().unwrap().contains(token.as_str()) {
            return Err(ConnectivityError::new("get", "connection reset"));
        }
        self.inner.get(token).await
    }

    async fn set(
        &self,
        token: &LocationToken,
        entry: &CachedLocation,
        ttl: Duration,
    ) -> Result<(), ConnectivityError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.enter("set").await?;
        self.inner.set(token, entry, ttl).await
    }

    async fn delete(&self, token: &LocationToken) -> Result<(), ConnectivityError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.enter("delete").await?;
        self.inner.delete(token).await
    }

    async fn keys(&self) -> Result<Vec<LocationToken>, ConnectivityError> {
        self.enter("keys").await?;
        self.inner.keys().await
    }

    async fn ping(&self) -> Result<(), ConnectivityError> {
        self.enter("ping").await
    }
}

/// Resolver backed by a mutable map, counting every call.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    records: Arc<Mutex<HashMap<String, LocationRecord>>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, record: LocationRecord) -> Self {
        self.insert(name, record);
        self
    }

    pub fn insert(&self, name: &str, record: LocationRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(name.to_owned(), record);
    }

    pub fn remove(&self, name: &str) {
        self.records.lock().unwrap().remove(name);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LocationResolver for StaticResolver {
    async fn resolve(&self, name: &str) -> atmos_upstream::Result<Option<LocationRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(atmos_upstream::Error::network_error().with_message("resolver down"));
        }
        Ok(self.records.lock().unwrap().get(name).cloned())
    }
}

/// Forecast provider echoing the request back as data.
#[derive(Debug, Clone, Default)]
pub struct EchoForecast {
    failing: Arc<AtomicBool>,
    empty: Arc<AtomicBool>,
}

impl EchoForecast {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ForecastProvider for EchoForecast {
    async fn fetch(
        &self,
        request: &ForecastRequest,
    ) -> atmos_upstream::Result<Option<serde_json::Value>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(atmos_upstream::Error::external_error().with_message("status 502"));
        }
        if self.empty.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(serde_json::to_value(request)?))
    }
}

pub fn bangkok() -> LocationRecord {
    LocationRecord::new("1609350", 100.50144, 13.75398, "Asia/Bangkok")
}

pub fn bkk() -> LocationRecord {
    LocationRecord::new("BKK", 100.5, 13.75, "Asia/Bangkok")
}

/// Everything a test needs to drive a [`ServiceState`].
#[derive(Debug, Clone)]
pub struct TestHarness {
    pub store: InstrumentedStore,
    pub resolver: StaticResolver,
    pub forecast: EchoForecast,
    pub health: HealthMonitor,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            store: InstrumentedStore::new(),
            resolver: StaticResolver::new().with("Bangkok", bangkok()),
            forecast: EchoForecast::default(),
            health: HealthMonitor::new(),
        }
    }

    pub fn with_store(mut self, store: InstrumentedStore) -> Self {
        self.store = store;
        self
    }

    pub fn cache(&self) -> LocationCache {
        LocationCache::new(self.store.clone(), self.health.clone())
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::new(
            self.health.clone(),
            self.cache(),
            LocationService::new(self.resolver.clone()),
            ForecastService::new(ForecastKind::Weather, self.forecast.clone()),
            ForecastService::new(ForecastKind::AirQuality, self.forecast.clone()),
        )
    }
}
