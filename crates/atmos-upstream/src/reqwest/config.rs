//! Open-Meteo client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests: 10 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com";
const DEFAULT_AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com";

/// Configuration for the upstream HTTP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct UpstreamConfig {
    /// Base URL of the geocoding API
    #[cfg_attr(
        feature = "config",
        arg(long, env = "GEOCODING_API_URL", default_value = DEFAULT_GEOCODING_URL)
    )]
    #[serde(default = "default_geocoding_url")]
    pub geocoding_api_url: String,

    /// Base URL of the weather forecast API
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORECAST_API_URL", default_value = DEFAULT_FORECAST_URL)
    )]
    #[serde(default = "default_forecast_url")]
    pub forecast_api_url: String,

    /// Base URL of the air-quality API
    #[cfg_attr(
        feature = "config",
        arg(long, env = "AIR_QUALITY_API_URL", default_value = DEFAULT_AIR_QUALITY_URL)
    )]
    #[serde(default = "default_air_quality_url")]
    pub air_quality_api_url: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "10")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_owned()
}

fn default_forecast_url() -> String {
    DEFAULT_FORECAST_URL.to_owned()
}

fn default_air_quality_url() -> String {
    DEFAULT_AIR_QUALITY_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geocoding_api_url: default_geocoding_url(),
            forecast_api_url: default_forecast_url(),
            air_quality_api_url: default_air_quality_url(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl UpstreamConfig {
    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("atmos/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Parses the geocoding base URL.
    pub fn geocoding_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.geocoding_api_url)
    }

    /// Parses the forecast base URL.
    pub fn forecast_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.forecast_api_url)
    }

    /// Parses the air-quality base URL.
    pub fn air_quality_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.air_quality_api_url)
    }

    /// Validates that every base URL parses and uses an HTTP scheme.
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("geocoding", self.geocoding_url()),
            ("forecast", self.forecast_url()),
            ("air-quality", self.air_quality_url()),
        ] {
            let url = url.map_err(|e| format!("{name} API URL is invalid: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "{name} API URL must use http or https, got '{}'",
                    url.scheme()
                ));
            }
        }

        Ok(())
    }

    /// Set the geocoding base URL.
    #[must_use]
    pub fn with_geocoding_url(mut self, url: impl Into<String>) -> Self {
        self.geocoding_api_url = url.into();
        self
    }

    /// Set the forecast base URL.
    #[must_use]
    pub fn with_forecast_url(mut self, url: impl Into<String>) -> Self {
        self.forecast_api_url = url.into();
        self
    }

    /// Set the air-quality base URL.
    #[must_use]
    pub fn with_air_quality_url(mut self, url: impl Into<String>) -> Self {
        self.air_quality_api_url = url.into();
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UpstreamConfig::default();
        assert_eq!(config.http_timeout, DEFAULT_TIMEOUT_SECS);
        assert!(config.user_agent.is_none());
        assert_eq!(
            config.geocoding_url().unwrap().as_str(),
            "https://geocoding-api.open-meteo.com/"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_values() {
        let config = UpstreamConfig::default().with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert!(config.effective_user_agent().starts_with("atmos/"));

        let config = config.with_user_agent("custom/1.0");
        assert_eq!(config.effective_user_agent(), "custom/1.0");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = UpstreamConfig::default().with_forecast_url("ftp://example.com");
        let error = config.validate().unwrap_err();
        assert!(error.contains("forecast"));

        let config = UpstreamConfig::default().with_geocoding_url("not a url");
        let error = config.validate().unwrap_err();
        assert!(error.contains("geocoding"));
    }
}
