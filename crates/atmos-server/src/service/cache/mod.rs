//! Location caching.
//!
//! - [`CacheStore`]: the key/value abstraction with [`NatsCacheStore`] and
//!   [`MemoryCacheStore`] backends.
//! - [`LocationCache`]: bounded, health-reporting access used on the request
//!   path.
//! - [`CachedLocation`]: the serialized value stored under `location:<token>`.

mod entry;
mod location_cache;
mod memory;
mod nats;
mod store;
mod token;

pub use entry::{CACHE_ENTRY_VERSION, CachedLocation};
pub use location_cache::{
    CacheLookup, DEFAULT_ENTRY_TTL, DEFAULT_OPERATION_TIMEOUT, LocationCache,
};
pub use memory::MemoryCacheStore;
pub use nats::NatsCacheStore;
pub(crate) use store::bounded;
pub use store::{CacheStore, ConnectivityError};
pub use token::{InvalidToken, LOCATION_KEY_PREFIX, LocationToken, MAX_TOKEN_LEN};
