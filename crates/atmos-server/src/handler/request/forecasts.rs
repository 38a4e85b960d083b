//! Forecast request types.

use serde::{Deserialize, Serialize};

/// Query string of `/weather` and `/air-quality`.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    /// Free-text location name, used when the token cannot be served.
    pub location_name: Option<String>,
    /// IANA timezone overriding the resolved location's timezone.
    pub manual_timezone: Option<String>,
    /// Quick-retrieve token from a previous response's `locationId`.
    #[serde(rename = "quickRetriveId")]
    pub quick_retrieve_id: Option<String>,
}

impl ForecastQuery {
    /// Returns the timezone override, ignoring blank values.
    pub fn timezone_override(&self) -> Option<&str> {
        self.manual_timezone
            .as_deref()
            .map(str::trim)
            .filter(|tz| !tz.is_empty())
    }
}
