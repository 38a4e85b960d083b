//! Reqwest-based HTTP client for the Open-Meteo APIs.

use std::sync::Arc;

use reqwest::header::{CACHE_CONTROL, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{Error, TRACING_TARGET, UpstreamConfig};
use crate::{
    ForecastKind, ForecastProvider, ForecastRequest, ForecastService, LocationRecord,
    LocationResolver, LocationService,
};

/// Weather variables requested from the forecast API.
const WEATHER_CURRENT: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,is_day,precipitation,weather_code,cloud_cover,wind_speed_10m,wind_direction_10m";
const WEATHER_HOURLY: &str =
    "temperature_2m,relative_humidity_2m,precipitation_probability,weather_code,wind_speed_10m";
const WEATHER_DAILY: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,uv_index_max,precipitation_sum";

/// Pollutants requested from the air-quality API.
const AIR_QUALITY_CURRENT: &str = "us_aqi,pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,sulphur_dioxide,ozone";
const AIR_QUALITY_HOURLY: &str = "us_aqi,pm10,pm2_5,ozone";

/// Timezone sent when the geocoder does not report one.
const FALLBACK_TIMEZONE: &str = "auto";

/// Inner client that holds the HTTP client and resolved endpoints.
struct OpenMeteoClientInner {
    http: Client,
    config: UpstreamConfig,
    geocoding: Url,
    forecast: Url,
    air_quality: Url,
}

/// Reqwest-based client for the Open-Meteo geocoding, forecast and
/// air-quality APIs.
///
/// Implements [`LocationResolver`] directly; the two forecast endpoints are
/// exposed through [`WeatherApi`] and [`AirQualityApi`].
#[derive(Clone)]
pub struct OpenMeteoClient {
    inner: Arc<OpenMeteoClientInner>,
}

impl std::fmt::Debug for OpenMeteoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenMeteoClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl OpenMeteoClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: UpstreamConfig) -> crate::Result<Self> {
        config
            .validate()
            .map_err(|reason| crate::Error::configuration().with_message(reason))?;

        let endpoint = |url: Result<Url, url::ParseError>, path: &str| {
            url.and_then(|base| base.join(path))
                .map_err(|e| crate::Error::configuration().with_source(e))
        };

        let geocoding = endpoint(config.geocoding_url(), "v1/search")?;
        let forecast = endpoint(config.forecast_url(), "v1/forecast")?;
        let air_quality = endpoint(config.air_quality_url(), "v1/air-quality")?;

        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            geocoding = %geocoding,
            forecast = %forecast,
            air_quality = %air_quality,
            "Creating Open-Meteo client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| {
                crate::Error::configuration()
                    .with_message("Failed to create HTTP client")
                    .with_source(e)
            })?;

        let inner = OpenMeteoClientInner {
            http,
            config,
            geocoding,
            forecast,
            air_quality,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &UpstreamConfig {
        &self.inner.config
    }

    /// Converts this client into a [`LocationService`].
    pub fn into_location_service(self) -> LocationService {
        LocationService::new(self)
    }

    /// Converts this client into a weather [`ForecastService`].
    pub fn into_weather_service(self) -> ForecastService {
        ForecastService::new(ForecastKind::Weather, WeatherApi(self))
    }

    /// Converts this client into an air-quality [`ForecastService`].
    pub fn into_air_quality_service(self) -> ForecastService {
        ForecastService::new(ForecastKind::AirQuality, AirQualityApi(self))
    }

    fn forecast_request(&self, endpoint: &Url, request: &ForecastRequest) -> RequestBuilder {
        let coordinates = &request.coordinates;
        let builder = self.inner.http.get(endpoint.clone()).query(&[
            ("latitude", coordinates.lat.to_string()),
            ("longitude", coordinates.long.to_string()),
            ("timezone", coordinates.tz.clone()),
        ]);

        if request.use_cache {
            builder
        } else {
            builder.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
        }
    }

    /// Sends a request and decodes the JSON body.
    ///
    /// A `404` is reported as `None`, as is an empty body.
    async fn send_json(
        &self,
        builder: RequestBuilder,
        endpoint: &'static str,
    ) -> super::Result<Option<serde_json::Value>> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(target: TRACING_TARGET, endpoint, "Upstream has no data");
            return Ok(None);
        }

        if !status.is_success() {
            return Err(Error::Status { status, endpoint });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok((!value.is_null()).then_some(value))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    id: i64,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    timezone: Option<String>,
}

impl GeocodingResponse {
    fn into_record(self) -> Option<LocationRecord> {
        let first = self.results.into_iter().next()?;
        Some(LocationRecord::new(
            first.id.to_string(),
            first.longitude,
            first.latitude,
            first
                .timezone
                .unwrap_or_else(|| FALLBACK_TIMEZONE.to_owned()),
        ))
    }
}

#[async_trait::async_trait]
impl LocationResolver for OpenMeteoClient {
    async fn resolve(&self, name: &str) -> crate::Result<Option<LocationRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let builder = self.inner.http.get(self.inner.geocoding.clone()).query(&[
            ("name", name),
            ("count", "1"),
            ("language", "en"),
            ("format", "json"),
        ]);

        let Some(body) = self.send_json(builder, "geocoding").await? else {
            return Ok(None);
        };

        let response: GeocodingResponse = serde_json::from_value(body)?;
        Ok(response.into_record())
    }
}

/// Weather forecast endpoint of an [`OpenMeteoClient`].
#[derive(Debug, Clone)]
pub struct WeatherApi(OpenMeteoClient);

#[async_trait::async_trait]
impl ForecastProvider for WeatherApi {
    async fn fetch(&self, request: &ForecastRequest) -> crate::Result<Option<serde_json::Value>> {
        let client = &self.0;
        let builder = client
            .forecast_request(&client.inner.forecast, request)
            .query(&[
                ("current", WEATHER_CURRENT),
                ("hourly", WEATHER_HOURLY),
                ("daily", WEATHER_DAILY),
            ]);

        Ok(client.send_json(builder, "forecast").await?)
    }
}

/// Air-quality endpoint of an [`OpenMeteoClient`].
#[derive(Debug, Clone)]
pub struct AirQualityApi(OpenMeteoClient);

#[async_trait::async_trait]
impl ForecastProvider for AirQualityApi {
    async fn fetch(&self, request: &ForecastRequest) -> crate::Result<Option<serde_json::Value>> {
        let client = &self.0;
        let builder = client
            .forecast_request(&client.inner.air_quality, request)
            .query(&[
                ("current", AIR_QUALITY_CURRENT),
                ("hourly", AIR_QUALITY_HOURLY),
            ]);

        Ok(client.send_json(builder, "air_quality").await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coordinates, ErrorKind};

    fn request(use_cache: bool) -> ForecastRequest {
        let coordinates = Coordinates {
            long: 100.5,
            lat: 13.75,
            tz: "Asia/Bangkok".to_owned(),
        };
        ForecastRequest::new("1609350", coordinates).with_cache(use_cache)
    }

    #[test]
    fn test_client_creation() {
        let client = OpenMeteoClient::new(UpstreamConfig::default()).unwrap();
        assert!(client.config().user_agent.is_none());
        assert_eq!(
            client.inner.forecast.as_str(),
            "https://api.open-meteo.com/v1/forecast"
        );
        assert_eq!(
            client.inner.geocoding.as_str(),
            "https://geocoding-api.open-meteo.com/v1/search"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = UpstreamConfig::default().with_air_quality_url("file:///etc");
        let error = OpenMeteoClient::new(config).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_forecast_request_cache_header() {
        let client = OpenMeteoClient::new(UpstreamConfig::default()).unwrap();

        let cached = client
            .forecast_request(&client.inner.forecast, &request(true))
            .build()
            .unwrap();
        assert!(cached.headers().get(CACHE_CONTROL).is_none());
        let query = cached.url().query().unwrap_or_default();
        assert!(query.contains("latitude=13.75"));
        assert!(query.contains("timezone=Asia%2FBangkok"));

        let uncached = client
            .forecast_request(&client.inner.forecast, &request(false))
            .build()
            .unwrap();
        assert_eq!(
            uncached.headers().get(CACHE_CONTROL).unwrap(),
            HeaderValue::from_static("no-cache")
        );
    }

    #[test]
    fn test_geocoding_takes_first_result() {
        let body = serde_json::json!({
            "results": [
                { "id": 1609350, "name": "Bangkok", "latitude": 13.75398, "longitude": 100.50144, "timezone": "Asia/Bangkok" },
                { "id": 1, "name": "Bangkok Noi", "latitude": 13.7, "longitude": 100.4 }
            ]
        });

        let response: GeocodingResponse = serde_json::from_value(body).unwrap();
        let record = response.into_record().unwrap();
        assert_eq!(record.location_id, "1609350");
        assert_eq!(record.timezone, "Asia/Bangkok");
    }

    #[test]
    fn test_geocoding_without_results() {
        let response: GeocodingResponse =
            serde_json::from_value(serde_json::json!({ "generationtime_ms": 0.4 })).unwrap();
        assert!(response.into_record().is_none());

        let body = serde_json::json!({ "results": [{ "id": 7, "latitude": 1.0, "longitude": 2.0 }] });
        let response: GeocodingResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.into_record().unwrap().timezone, FALLBACK_TIMEZONE);
    }
}
