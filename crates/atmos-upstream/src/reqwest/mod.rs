//! Reqwest-based clients for the Open-Meteo APIs.
//!
//! This module provides implementations of [`LocationResolver`] and
//! [`ForecastProvider`] backed by the public Open-Meteo geocoding, forecast
//! and air-quality endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use atmos_upstream::reqwest::{OpenMeteoClient, UpstreamConfig};
//!
//! let client = OpenMeteoClient::new(UpstreamConfig::default())?;
//!
//! let locations = client.clone().into_location_service();
//! let weather = client.clone().into_weather_service();
//! let air_quality = client.into_air_quality_service();
//! ```
//!
//! [`LocationResolver`]: crate::LocationResolver
//! [`ForecastProvider`]: crate::ForecastProvider

mod client;
mod config;
mod error;

pub use client::{AirQualityApi, OpenMeteoClient, WeatherApi};
pub use config::UpstreamConfig;
pub use error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "atmos_upstream::reqwest";
