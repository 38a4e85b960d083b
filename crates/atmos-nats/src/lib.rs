#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for NATS client operations.
///
/// Use this target for logging client initialization, configuration, and client-level errors.
pub const TRACING_TARGET_CLIENT: &str = "atmos_nats::client";

/// Tracing target for NATS key-value store operations.
///
/// Use this target for logging KV bucket operations, key operations, and KV-related errors.
pub const TRACING_TARGET_KV: &str = "atmos_nats::kv";

/// Tracing target for NATS connection operations.
pub const TRACING_TARGET_CONNECTION: &str = "atmos_nats::connection";

mod client;
mod error;
pub mod kv;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
