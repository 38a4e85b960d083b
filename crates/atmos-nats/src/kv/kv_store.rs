//! Typed JSON values in a JetStream KV bucket.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use async_nats::jetstream::{self, kv};
use futures::TryStreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{KvBucket, KvKey};
use crate::{Error, Result, TRACING_TARGET_KV};

/// JetStream KV bucket `B` holding JSON-encoded `V` values under keys `K`.
///
/// Only the latest revision of each key is kept.
#[derive(Clone)]
pub struct KvStore<K, V, B> {
    store: kv::Store,
    marker: PhantomData<fn() -> (K, V, B)>,
}

impl<K, V, B: KvBucket> fmt::Debug for KvStore<K, V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore")
            .field("bucket", &B::NAME)
            .finish_non_exhaustive()
    }
}

impl<K, V, B> KvStore<K, V, B>
where
    K: KvKey,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: KvBucket,
{
    /// Opens bucket `B`, creating it with `max_age` when it does not exist.
    ///
    /// `max_age` bounds how long any entry survives, whatever deadline the
    /// stored value carries. An existing bucket keeps its own settings.
    #[tracing::instrument(skip(jetstream), target = TRACING_TARGET_KV)]
    pub(crate) async fn open(jetstream: &jetstream::Context, max_age: Duration) -> Result<Self> {
        let store = match jetstream.get_key_value(B::NAME).await {
            Ok(store) => store,
            Err(_) => {
                tracing::info!(
                    target: TRACING_TARGET_KV,
                    bucket = B::NAME,
                    max_age_secs = max_age.as_secs(),
                    "Creating KV bucket"
                );
                jetstream
                    .create_key_value(kv::Config {
                        bucket: B::NAME.to_owned(),
                        description: B::DESCRIPTION.to_owned(),
                        max_age,
                        history: 1,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| Error::operation("kv_create", e.to_string()))?
            }
        };

        Ok(Self {
            store,
            marker: PhantomData,
        })
    }

    #[inline]
    pub fn bucket_name(&self) -> &'static str {
        B::NAME
    }

    /// Stores `value` under `key`, returning the new revision.
    #[tracing::instrument(skip(self, value), target = TRACING_TARGET_KV)]
    pub async fn put(&self, key: &K, value: &V) -> Result<u64> {
        let payload = serde_json::to_vec(value)?;
        self.store
            .put(key.to_string(), payload.into())
            .await
            .map_err(|e| Error::operation("kv_put", e.to_string()))
    }

    /// Reads the value under `key`; deleted or purged keys read as `None`.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_KV)]
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        let entry = self
            .store
            .entry(key.to_string())
            .await
            .map_err(|e| Error::operation("kv_get", e.to_string()))?;

        match entry {
            Some(entry) if matches!(entry.operation, kv::Operation::Put) => {
                Ok(Some(serde_json::from_slice(&entry.value)?))
            }
            _ => Ok(None),
        }
    }

    /// Purges `key` and its history.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_KV)]
    pub async fn delete(&self, key: &K) -> Result<()> {
        self.store
            .purge(key.to_string())
            .await
            .map_err(|e| Error::operation("kv_delete", e.to_string()))
    }

    /// Lists the bucket's keys that parse as `K`; anything else is ignored.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_KV)]
    pub async fn keys(&self) -> Result<Vec<K>> {
        let raw: Vec<String> = self
            .store
            .keys()
            .await
            .map_err(|e| Error::operation("kv_keys", e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| Error::operation("kv_keys", e.to_string()))?;

        let keys: Vec<K> = raw.iter().filter_map(|key| key.parse().ok()).collect();
        tracing::debug!(
            target: TRACING_TARGET_KV,
            bucket = B::NAME,
            listed = raw.len(),
            kept = keys.len(),
            "Listed KV keys"
        );
        Ok(keys)
    }
}
