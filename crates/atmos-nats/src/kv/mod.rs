//! NATS Key-Value store operations.
//!
//! This module provides type-safe abstractions over NATS KV:
//! - `KvStore<K, V, B>`: Generic type-safe key-value operations
//! - `KvKey`: Trait for key types
//! - `KvBucket`: Trait for bucket configuration
//!
//! # Example
//!
//! ```ignore
//! let store: KvStore<LocationKey, CachedLocation, LocationsBucket> =
//!     nats_client.kv_store(Duration::from_secs(3600)).await?;
//!
//! let key = LocationKey::new("1609350")?;
//! store.put(&key, &entry).await?;
//! let entry = store.get(&key).await?;
//! ```

mod kv_bucket;
mod kv_key;
mod kv_store;

pub use kv_bucket::{KvBucket, LocationsBucket};
pub use kv_key::{KvKey, LocationKey};
pub use kv_store::KvStore;
