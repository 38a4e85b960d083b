//! Listener configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{Result as AnyhowResult, ensure};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Unprivileged ports the gateway may listen on.
const PORTS: RangeInclusive<u16> = 1024..=u16::MAX;
/// Accepted shutdown grace periods, in seconds.
const SHUTDOWN_SECS: RangeInclusive<u64> = 1..=300;

/// Where the gateway listens and how long it drains on shutdown.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Seconds granted to in-flight requests and the revalidation worker
    /// once a shutdown signal arrives.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    /// Rejects privileged ports and out-of-range grace periods.
    pub fn validate(&self) -> AnyhowResult<()> {
        ensure!(
            PORTS.contains(&self.port),
            "PORT {} is privileged; pick one in {PORTS:?}",
            self.port
        );
        ensure!(
            SHUTDOWN_SECS.contains(&self.shutdown_timeout),
            "SHUTDOWN_TIMEOUT {}s is outside {SHUTDOWN_SECS:?}",
            self.shutdown_timeout
        );
        Ok(())
    }

    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            addr = %self.server_addr(),
            shutdown_timeout_secs = self.shutdown_timeout,
            "Listener configuration"
        );
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            shutdown_timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_loopback() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server_addr(), "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn privileged_port_is_rejected() {
        let config = ServerConfig {
            port: 80,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shutdown_grace_period_is_bounded() {
        for (secs, ok) in [(0, false), (1, true), (300, true), (301, false)] {
            let config = ServerConfig {
                shutdown_timeout: secs,
                ..ServerConfig::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "{secs}s");
        }
    }
}
