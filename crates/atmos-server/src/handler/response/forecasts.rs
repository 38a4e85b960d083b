//! Forecast response types.

use serde::{Deserialize, Serialize};

use super::Envelope;

/// Message sent with every successful forecast.
const SUCCESS_MESSAGE: &str = "Data fetched successfully";

/// Successful `/weather` and `/air-quality` body.
///
/// `locationId` can be sent back as `quickRetriveId` to skip name
/// resolution on the next request.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub envelope: Envelope<serde_json::Value>,
    pub location_id: String,
}

impl ForecastResponse {
    /// Wraps upstream data.
    pub fn new(location_id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            envelope: Envelope::new(SUCCESS_MESSAGE, Some(data)),
            location_id: location_id.into(),
        }
    }
}
