//! Request identifiers.
//!
//! Every inbound request carries an `X-Request-ID` (unique per hop) and an
//! `X-Correlation-ID` (shared across the hops of one exchange). Both are
//! echoed on the response and generated when the caller sent none.

use std::fmt;

use axum::http::{HeaderMap, HeaderName};
use uuid::Uuid;

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Header carrying the cross-request correlation identifier.
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Longest caller-supplied identifier that is echoed back unchanged.
const MAX_ID_LEN: usize = 128;

/// Identifiers of one inbound request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIds {
    pub request_id: String,
    pub correlation_id: String,
}

impl RequestIds {
    /// Take the identifiers from `headers`, generating any that are absent
    /// or unusable. Request IDs are UUID v4; correlation IDs are UUID v7 so
    /// they sort by creation time.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id =
            header_id(headers, &REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string());
        let correlation_id = header_id(headers, &CORRELATION_ID_HEADER)
            .unwrap_or_else(|| CorrelationId::new().to_string());
        Self {
            request_id,
            correlation_id,
        }
    }
}

fn header_id(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    let usable = !value.is_empty()
        && value.len() <= MAX_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    usable.then(|| value.to_string())
}

/// Time-ordered correlation identifier (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
