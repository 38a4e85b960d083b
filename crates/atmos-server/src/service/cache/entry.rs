//! The value stored under `location:<token>`.

use std::time::Duration;

use atmos_upstream::LocationRecord;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// Current version of the cached value layout.
pub const CACHE_ENTRY_VERSION: u32 = 1;

/// A resolved location together with the query that produced it.
///
/// Serialized as camelCase JSON:
///
/// ```json
/// {
///   "version": 1,
///   "query": "Bangkok",
///   "record": { "locationId": "1609350", "longitude": 100.5, "latitude": 13.75, "timezone": "Asia/Bangkok" },
///   "cachedAt": "2024-05-01T10:00:00Z",
///   "expiresAt": "2024-05-01T11:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLocation {
    /// Layout version, see [`CACHE_ENTRY_VERSION`].
    pub version: u32,
    /// Location name the record was resolved from.
    pub query: String,
    /// The resolved location.
    pub record: LocationRecord,
    /// When the entry was written.
    pub cached_at: Timestamp,
    /// When the entry stops being served.
    pub expires_at: Timestamp,
}

impl CachedLocation {
    /// Creates an entry that expires `ttl` from now.
    pub fn new(query: impl Into<String>, record: LocationRecord, ttl: Duration) -> Self {
        let cached_at = Timestamp::now();
        Self {
            version: CACHE_ENTRY_VERSION,
            query: query.into(),
            record,
            cached_at,
            expires_at: deadline(cached_at, ttl),
        }
    }

    /// Returns the same entry with a fresh deadline.
    #[must_use]
    pub fn refreshed(&self, ttl: Duration) -> Self {
        Self::new(self.query.clone(), self.record.clone(), ttl)
    }

    /// Returns an entry for the same query with a replacement record.
    #[must_use]
    pub fn updated(&self, record: LocationRecord, ttl: Duration) -> Self {
        Self::new(self.query.clone(), record, ttl)
    }

    /// Returns `true` if the entry was written with a layout this build reads.
    #[inline]
    pub fn is_current_version(&self) -> bool {
        self.version == CACHE_ENTRY_VERSION
    }

    /// Returns `true` if the entry's deadline has passed at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the entry's deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

fn deadline(from: Timestamp, ttl: Duration) -> Timestamp {
    SignedDuration::try_from(ttl)
        .ok()
        .and_then(|ttl| from.checked_add(ttl).ok())
        .unwrap_or(Timestamp::MAX)
}
