//! Key-value bucket configuration traits.

/// Marker trait for KV bucket configuration.
pub trait KvBucket: Clone + Send + Sync + 'static {
    /// Bucket name used in NATS KV.
    const NAME: &'static str;

    /// Human-readable description for the bucket.
    const DESCRIPTION: &'static str;
}

/// Bucket for resolved locations addressed by quick-retrieve tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocationsBucket;

impl KvBucket for LocationsBucket {
    const NAME: &'static str = "atmos_locations";
    const DESCRIPTION: &'static str = "Resolved locations keyed by quick-retrieve token";
}
