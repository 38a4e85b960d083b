//! NATS JetStream KV cache backend.

use std::sync::Arc;
use std::time::Duration;

use atmos_nats::NatsClient;
use atmos_nats::kv::{KvStore, LocationKey, LocationsBucket};
use tokio::sync::OnceCell;

use super::{CacheStore, CachedLocation, ConnectivityError, LocationToken};

/// Tracing target for the NATS cache backend.
const TRACING_TARGET_NATS_CACHE: &str = "atmos_server::service::cache::nats";

type LocationStore = KvStore<LocationKey, CachedLocation, LocationsBucket>;

/// Cache store backed by the `atmos_locations` JetStream KV bucket.
///
/// The bucket is opened on first use so the gateway can start while NATS is
/// still unreachable; until then every operation fails with a
/// [`ConnectivityError`].
#[derive(Debug, Clone)]
pub struct NatsCacheStore {
    client: NatsClient,
    ttl: Duration,
    bucket: Arc<OnceCell<LocationStore>>,
}

impl NatsCacheStore {
    /// Creates a store whose bucket keeps entries for at most `ttl`.
    pub fn new(client: NatsClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            bucket: Arc::new(OnceCell::new()),
        }
    }

    async fn bucket(&self) -> Result<&LocationStore, ConnectivityError> {
        self.bucket
            .get_or_try_init(|| async {
                let store = self.client.kv_store(self.ttl).await?;
                tracing::info!(
                    target: TRACING_TARGET_NATS_CACHE,
                    bucket = store.bucket_name(),
                    ttl_secs = self.ttl.as_secs(),
                    "Location bucket opened"
                );
                Ok::<_, atmos_nats::Error>(store)
            })
            .await
            .map_err(|error| nats_error("open_bucket", error))
    }

    fn key(
        operation: &'static str,
        token: &LocationToken,
    ) -> Result<LocationKey, ConnectivityError> {
        LocationKey::new(token.as_str()).map_err(|error| nats_error(operation, error))
    }
}

fn nats_error(operation: &'static str, error: atmos_nats::Error) -> ConnectivityError {
    ConnectivityError::new(operation, error.to_string())
}

#[async_trait::async_trait]
impl CacheStore for NatsCacheStore {
    fn backend(&self) -> &'static str {
        "nats"
    }

    async fn get(
        &self,
        token: &LocationToken,
    ) -> Result<Option<CachedLocation>, ConnectivityError> {
        let key = Self::key("get", token)?;
        match self.bucket().await?.get(&key).await {
            Ok(value) => Ok(value),
            Err(atmos_nats::Error::Serialization(error)) => {
                tracing::warn!(
                    target: TRACING_TARGET_NATS_CACHE,
                    key = %key,
                    error = %error,
                    "Unreadable cache entry treated as absent"
                );
                Ok(None)
            }
            Err(error) => Err(nats_error("get", error)),
        }
    }

    async fn set(
        &self,
        token: &LocationToken,
        entry: &CachedLocation,
        _ttl: Duration,
    ) -> Result<(), ConnectivityError> {
        let key = Self::key("set", token)?;
        self.bucket()
            .await?
            .put(&key, entry)
            .await
            .map(|_| ())
            .map_err(|error| nats_error("set", error))
    }

    async fn delete(&self, token: &LocationToken) -> Result<(), ConnectivityError> {
        let key = Self::key("delete", token)?;
        self.bucket()
            .await?
            .delete(&key)
            .await
            .map_err(|error| nats_error("delete", error))
    }

    async fn keys(&self) -> Result<Vec<LocationToken>, ConnectivityError> {
        let keys = self
            .bucket()
            .await?
            .keys()
            .await
            .map_err(|error| nats_error("keys", error))?;

        Ok(keys
            .iter()
            .filter_map(|key| LocationToken::new(key.token()).ok())
            .collect())
    }

    async fn ping(&self) -> Result<(), ConnectivityError> {
        if !self.client.is_connected() {
            return Err(ConnectivityError::new("ping", "nats is not connected"));
        }

        self.client
            .ping()
            .await
            .map(|rtt| {
                tracing::trace!(
                    target: TRACING_TARGET_NATS_CACHE,
                    rtt_ms = rtt.as_millis(),
                    "Cache store ping"
                );
            })
            .map_err(|error| nats_error("ping", error))
    }
}
