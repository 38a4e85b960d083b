//! Revalidation worker configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// Default values
const DEFAULT_INTERVAL_SECS: u64 = 300;
const DEFAULT_RECOVERY_INTERVAL_SECS: u64 = 10;
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Scheduling and failure policy of the revalidation worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RevalidationConfig {
    /// Seconds between full revalidation cycles
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REVALIDATION_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)
    )]
    #[serde(default = "default_interval_secs")]
    pub revalidation_interval_secs: u64,

    /// Seconds between connectivity probes while paused
    #[cfg_attr(
        feature = "config",
        arg(long, env = "RECOVERY_INTERVAL_SECS", default_value_t = DEFAULT_RECOVERY_INTERVAL_SECS)
    )]
    #[serde(default = "default_recovery_interval_secs")]
    pub recovery_interval_secs: u64,

    /// Consecutive cache failures that pause the worker
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REVALIDATION_FAILURE_THRESHOLD", default_value_t = DEFAULT_FAILURE_THRESHOLD)
    )]
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Upper bound on a single cache operation made by the worker, in milliseconds
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REVALIDATION_STORE_TIMEOUT_MS", default_value_t = DEFAULT_STORE_TIMEOUT_MS)
    )]
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Capacity of the command and report channels
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REVALIDATION_CHANNEL_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)
    )]
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_recovery_interval_secs() -> u64 {
    DEFAULT_RECOVERY_INTERVAL_SECS
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_store_timeout_ms() -> u64 {
    DEFAULT_STORE_TIMEOUT_MS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for RevalidationConfig {
    fn default() -> Self {
        Self {
            revalidation_interval_secs: DEFAULT_INTERVAL_SECS,
            recovery_interval_secs: DEFAULT_RECOVERY_INTERVAL_SECS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl RevalidationConfig {
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.revalidation_interval_secs)
    }

    #[inline]
    pub fn recovery_interval(&self) -> Duration {
        Duration::from_secs(self.recovery_interval_secs)
    }

    #[inline]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.revalidation_interval_secs == 0 {
            return Err(Error::config("Revalidation interval must be greater than 0"));
        }
        if self.recovery_interval_secs == 0 {
            return Err(Error::config("Recovery interval must be greater than 0"));
        }
        if self.failure_threshold == 0 {
            return Err(Error::config("Failure threshold must be greater than 0"));
        }
        if self.store_timeout_ms == 0 {
            return Err(Error::config("Worker store timeout must be greater than 0"));
        }
        if self.channel_capacity == 0 {
            return Err(Error::config("Worker channel capacity must be greater than 0"));
        }

        Ok(())
    }

    /// Set the interval between full cycles.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.revalidation_interval_secs = interval.as_secs();
        self
    }

    /// Set the interval between recovery probes.
    #[must_use]
    pub fn with_recovery_interval(mut self, interval: Duration) -> Self {
        self.recovery_interval_secs = interval.as_secs();
        self
    }

    /// Set the number of consecutive failures that pause the worker.
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RevalidationConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.recovery_interval(), Duration::from_secs(10));
        assert_eq!(config.failure_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_values() {
        let config = RevalidationConfig::default().with_failure_threshold(0);
        assert!(config.validate().is_err());

        let config = RevalidationConfig::default().with_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
