//! # `OcpiResponseBody` Envelope
//!
//! The uniform wrapper for every OCPI response:
//!
//! ```json
//! {"data": ..., "status_code": 1000, "status_message": "Success", "timestamp": "2015-06-30T21:59:59Z"}
//! ```
//!
//! When the status code is in the success range (1xxx), `data` holds the
//! payload with the cardinality of the endpoint (object or list). Otherwise
//! `data` is null and `status_message` explains the failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::status::OcpiStatus;

/// The response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcpiResponseBody<T> {
    /// Payload; only meaningful for success status codes.
    pub data: Option<T>,
    /// OCPI status code (not the HTTP status).
    pub status_code: u32,
    /// Optional message that may help debugging.
    pub status_message: Option<String>,
    /// Time this message was generated.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl<T> OcpiResponseBody<T> {
    /// Successful envelope carrying `data`.
    pub fn success(data: T, clock: &dyn Clock) -> Self {
        Self::from_parts(Some(data), OcpiStatus::Success, None, clock)
    }

    /// Successful envelope with null data.
    pub fn success_empty(clock: &dyn Clock) -> Self {
        Self::from_parts(None, OcpiStatus::Success, None, clock)
    }

    /// Failure envelope for a known status. `message` overrides the default text.
    pub fn failure(status: OcpiStatus, message: Option<String>, clock: &dyn Clock) -> Self {
        Self::from_parts(None, status, message, clock)
    }

    /// Shorthand for a `2001 Invalid or missing parameters` envelope.
    pub fn invalid(message: impl Into<String>, clock: &dyn Clock) -> Self {
        Self::failure(
            OcpiStatus::ClientInvalidParameters,
            Some(message.into()),
            clock,
        )
    }

    fn from_parts(
        data: Option<T>,
        status: OcpiStatus,
        message: Option<String>,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            data,
            status_code: status.code(),
            status_message: Some(message.unwrap_or_else(|| status.default_message().to_string())),
            timestamp: clock.now(),
        }
    }

    /// Whether the status code is in the success family.
    pub fn is_success(&self) -> bool {
        OcpiStatus::is_success_code(self.status_code)
    }

    /// Known status for this envelope's code, if any.
    pub fn status(&self) -> Option<OcpiStatus> {
        OcpiStatus::from_code(self.status_code)
    }

    /// Transform the payload, keeping status and timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OcpiResponseBody<U> {
        OcpiResponseBody {
            data: self.data.map(f),
            status_code: self.status_code,
            status_message: self.status_message,
            timestamp: self.timestamp,
        }
    }
}

/// RFC3339 timestamps with second precision and a `Z` suffix.
///
/// Incoming timestamps without an offset are read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    /// Deserialize RFC3339, tolerating a missing offset.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Render a timestamp the way envelopes carry it.
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Parse an OCPI DateTime.
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }
}
