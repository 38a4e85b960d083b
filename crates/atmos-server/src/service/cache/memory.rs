//! In-process cache backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheStore, CachedLocation, ConnectivityError, LocationToken};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: CachedLocation,
    /// `None` when the TTL does not fit in an `Instant`.
    deadline: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| now < deadline)
    }
}

/// Cache store kept in process memory.
///
/// Used as the development backend and in tests. Never fails, so the health
/// monitor only turns unhealthy if a revalidation cycle fails for another
/// reason.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<LocationToken, MemoryEntry>>>,
}

impl MemoryCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCacheStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(
        &self,
        token: &LocationToken,
    ) -> Result<Option<CachedLocation>, ConnectivityError> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        Ok(entries
            .get(token)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(
        &self,
        token: &LocationToken,
        entry: &CachedLocation,
        ttl: Duration,
    ) -> Result<(), ConnectivityError> {
        let deadline = Instant::now().checked_add(ttl);
        let entry = MemoryEntry {
            value: entry.clone(),
            deadline,
        };

        self.entries.write().await.insert(token.clone(), entry);
        Ok(())
    }

    async fn delete(&self, token: &LocationToken) -> Result<(), ConnectivityError> {
        self.entries.write().await.remove(token);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<LocationToken>, ConnectivityError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));

        let mut keys: Vec<_> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), ConnectivityError> {
        Ok(())
    }
}
