//! Weather and air-quality handlers.
//!
//! Both endpoints share one flow: resolve the location through the
//! quick-retrieve lookup, write resolver results back to the cache, then ask
//! the matching forecast provider for data.

use atmos_upstream::{ForecastKind, ForecastRequest};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::request::ForecastQuery;
use super::response::ForecastResponse;
use crate::extract::Query;
use crate::handler::Result;
use crate::service::{QuickRetrieve, ServiceState};

/// Tracing target for forecast operations.
const TRACING_TARGET: &str = "atmos_server::handler::forecasts";

/// Returns weather data for a location.
#[tracing::instrument(skip_all)]
async fn weather(
    State(service_state): State<ServiceState>,
    State(lookup): State<QuickRetrieve>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>> {
    fetch_forecast(ForecastKind::Weather, &service_state, &lookup, query).await
}

/// Returns air-quality data for a location.
#[tracing::instrument(skip_all)]
async fn air_quality(
    State(service_state): State<ServiceState>,
    State(lookup): State<QuickRetrieve>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>> {
    fetch_forecast(ForecastKind::AirQuality, &service_state, &lookup, query).await
}

async fn fetch_forecast(
    kind: ForecastKind,
    service_state: &ServiceState,
    lookup: &QuickRetrieve,
    query: ForecastQuery,
) -> Result<Json<ForecastResponse>> {
    tracing::debug!(
        target: TRACING_TARGET,
        kind = %kind,
        has_token = query.quick_retrieve_id.is_some(),
        location_name = query.location_name.as_deref(),
        "Forecast requested"
    );

    let resolved = lookup
        .lookup(
            query.quick_retrieve_id.as_deref(),
            query.location_name.as_deref(),
        )
        .await?;

    let from_cache = resolved.is_cached();
    if !from_cache {
        lookup.remember(&resolved).await;
    }

    let record = resolved.record;
    let coordinates = record.coordinates(query.timezone_override());
    let request = ForecastRequest::new(record.location_id.as_str(), coordinates);

    let data = service_state
        .forecast(kind)
        .fetch(&request)
        .await
        .map_err(crate::Error::from)?
        .ok_or_else(|| crate::Error::upstream_fetch(kind.to_string(), "no data returned"))?;

    tracing::info!(
        target: TRACING_TARGET,
        kind = %kind,
        location_id = %record.location_id,
        from_cache,
        "Forecast served"
    );

    Ok(Json(ForecastResponse::new(record.location_id, data)))
}

/// Returns a [`Router`] with the forecast routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/weather", get(weather))
        .route("/air-quality", get(air_quality))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::handler::test::create_test_server;
    use crate::service::testing::{TestHarness, bkk};

    #[tokio::test]
    async fn weather_by_name() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        let server = create_test_server(harness.state())?;

        let response = server
            .get("/weather")
            .add_query_param("locationName", "Bangkok")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["message"], "Data fetched successfully");
        assert_eq!(body["locationId"], "1609350");
        assert_eq!(body["data"]["location_id"], "1609350");
        assert_eq!(body["data"]["use_cache"], true);
        assert_eq!(body["data"]["coordinates"]["tz"], "Asia/Bangkok");
        assert_eq!(body["current"].as_str().map(str::len), Some(8));
        Ok(())
    }

    #[tokio::test]
    async fn air_quality_with_cached_token() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        harness.store.seed("abc123", "Bangkok", bkk()).await;
        harness.health.report_healthy();
        let server = create_test_server(harness.state())?;

        let response = server
            .get("/air-quality")
            .add_query_param("quickRetriveId", "abc123")
            .add_query_param("locationName", "Bangkok")
            .add_query_param("manualTimezone", "UTC")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["locationId"], "BKK");
        assert_eq!(body["data"]["coordinates"]["tz"], "UTC");
        assert_eq!(harness.resolver.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unhealthy_cache_resolves_by_name() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        harness.store.seed("abc123", "Bangkok", bkk()).await;
        let server = create_test_server(harness.state())?;

        let response = server
            .get("/weather")
            .add_query_param("quickRetriveId", "abc123")
            .add_query_param("locationName", "Bangkok")
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["locationId"], "1609350");
        assert_eq!(harness.resolver.calls(), 1);
        assert_eq!(harness.store.gets(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_name_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server(TestHarness::new().state())?;

        let response = server
            .get("/weather")
            .add_query_param("locationName", "")
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert_eq!(body["message"], "Location not found");
        assert!(body["data"].is_null());
        Ok(())
    }

    #[tokio::test]
    async fn upstream_failure_is_500() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        harness.forecast.set_failing(true);
        let server = create_test_server(harness.state())?;

        let response = server
            .get("/air-quality")
            .add_query_param("locationName", "Bangkok")
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = response.json();
        assert_eq!(body["message"], "Error fetching data");
        assert!(body["data"].is_null());
        Ok(())
    }

    #[tokio::test]
    async fn resolver_failure_is_not_found() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        harness.resolver.set_failing(true);
        let server = create_test_server(harness.state())?;

        let response = server
            .get("/weather")
            .add_query_param("locationName", "Bangkok")
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert_eq!(body["message"], "Location not found");
        Ok(())
    }

    #[tokio::test]
    async fn empty_upstream_data_is_500() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        harness.forecast.set_empty(true);
        let server = create_test_server(harness.state())?;

        let response = server
            .get("/weather")
            .add_query_param("locationName", "Bangkok")
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = response.json();
        assert_eq!(body["message"], "Error fetching data");
        assert!(body["data"].is_null());
        assert!(body.get("locationId").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn returned_location_id_works_as_token() -> anyhow::Result<()> {
        let harness = TestHarness::new();
        harness.health.report_healthy();
        let server = create_test_server(harness.state())?;

        let first: Value = server
            .get("/weather")
            .add_query_param("locationName", "Bangkok")
            .await
            .json();
        let token = first["locationId"].as_str().unwrap_or_default().to_owned();

        let second = server
            .get("/weather")
            .add_query_param("quickRetriveId", &token)
            .await;
        second.assert_status_ok();
        assert_eq!(harness.resolver.calls(), 1);
        assert_eq!(harness.store.sets(), 1);
        Ok(())
    }
}
