use std::borrow::Cow;

use jiff::Timestamp;
use jiff::tz::{self, TimeZone};
use serde::{Deserialize, Serialize};

/// Timezone in which `current` is reported.
pub const REPORTING_TIMEZONE: &str = "Asia/Bangkok";

/// Offset used when the timezone database has no entry for
/// [`REPORTING_TIMEZONE`].
const REPORTING_OFFSET_HOURS: i8 = 7;

/// Returns the wall clock time as `HH:MM:SS` in [`REPORTING_TIMEZONE`].
pub fn wall_clock() -> String {
    wall_clock_at(Timestamp::now())
}

fn wall_clock_at(timestamp: Timestamp) -> String {
    let zoned = timestamp.in_tz(REPORTING_TIMEZONE).unwrap_or_else(|_| {
        timestamp.to_zoned(TimeZone::fixed(tz::offset(REPORTING_OFFSET_HOURS)))
    });
    zoned.strftime("%H:%M:%S").to_string()
}

/// The `{ current, message, data }` body shared by every endpoint.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Server wall clock time, `HH:MM:SS`.
    pub current: String,
    pub message: Cow<'static, str>,
    /// Payload; `null` on errors.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Wraps `data` with the given message.
    pub fn new(message: impl Into<Cow<'static, str>>, data: Option<T>) -> Self {
        Self {
            current: wall_clock(),
            message: message.into(),
            data,
        }
    }
}

impl Envelope<()> {
    /// An envelope without data.
    pub fn failure(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(message, None)
    }
}
