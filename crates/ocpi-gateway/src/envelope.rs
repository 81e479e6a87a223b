//! Rendering handler results as OCPI responses.
//!
//! Handlers return an [`OcpiResult`]. [`render`] wraps it in the
//! `{data, status_code, status_message, timestamp}` envelope, picks the HTTP
//! status and adds the `WWW-Authenticate` and pagination headers.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use crate::domain::config::PaginationConfig;
use ocpi_types::{
    pagination::next_offset, Clock, OcpiError, OcpiResponseBody, PaginationParams, SearchResult,
    TOKEN_SCHEME,
};
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use tracing::{debug, error};

/// Successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A single object (or an unpaged list).
    Data(Value),
    /// Success without a payload.
    Empty,
    /// One page of a list endpoint.
    Page(SearchResult<Value>),
}

impl Reply {
    /// Serialize `value` as the reply payload.
    pub fn data<T: Serialize>(value: &T) -> Result<Self, OcpiError> {
        serde_json::to_value(value)
            .map(Reply::Data)
            .map_err(|e| OcpiError::Internal(format!("could not encode response: {e}")))
    }

    /// Serialize every item of a page.
    pub fn page<T: Serialize>(page: SearchResult<T>) -> Result<Self, OcpiError> {
        let list = page
            .list
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| OcpiError::Internal(format!("could not encode response: {e}")))?;
        Ok(Reply::Page(SearchResult {
            list,
            total_count: page.total_count,
            limit: page.limit,
            offset: page.offset,
        }))
    }
}

/// What every handler returns.
pub type OcpiResult = Result<Reply, OcpiError>;

/// The parts of an inbound request the envelope layer needs.
#[derive(Debug, Clone)]
pub struct OcpiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Raw `Authorization` header, when present and readable.
    pub authorization: Option<String>,
}

impl OcpiRequest {
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Value of the first query parameter called `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// `offset` and `limit` from the query, resolved against `config`.
    pub fn pagination(&self, config: &PaginationConfig) -> Result<PaginationParams, OcpiError> {
        Ok(PaginationParams::resolve(
            self.count_param("offset")?,
            self.count_param("limit")?,
            config.default_limit,
            config.max_limit,
        ))
    }

    fn count_param(&self, name: &str) -> Result<Option<usize>, OcpiError> {
        self.query_param(name)
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| {
                    OcpiError::Validation(format!("{name} must be a non-negative integer"))
                })
            })
            .transpose()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OcpiRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            authorization: parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }
}

/// HTTP status for a successful reply.
fn success_status(method: &Method, reply: &Reply) -> StatusCode {
    match reply {
        Reply::Data(Value::Null) | Reply::Empty if *method == Method::GET => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    }
}

/// Render `result` for `request`. `base_url` is the public origin used in
/// `Link` headers.
pub fn render(
    result: OcpiResult,
    request: &OcpiRequest,
    base_url: &str,
    clock: &dyn Clock,
) -> Response {
    match result {
        Ok(reply) => {
            let status = success_status(&request.method, &reply);
            let mut headers = HeaderMap::new();
            let data = match reply {
                Reply::Data(Value::Null) | Reply::Empty => None,
                Reply::Data(value) => Some(value),
                Reply::Page(page) => {
                    pagination_headers(&mut headers, &page, request, base_url);
                    Some(Value::Array(page.list))
                }
            };
            let body = match data {
                Some(value) => OcpiResponseBody::success(value, clock),
                None => OcpiResponseBody::success_empty(clock),
            };
            json_response(status, headers, &body)
        }
        Err(err) => render_error(&err, clock),
    }
}

/// Envelope for a failure, with the status and headers [`OcpiError`] maps to.
pub fn render_error(err: &OcpiError, clock: &dyn Clock) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "request failed");
    } else {
        debug!(status = status.as_u16(), error = %err, "request rejected");
    }

    let mut headers = HeaderMap::new();
    if err.requires_challenge() {
        headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(TOKEN_SCHEME));
    }
    let body: OcpiResponseBody<Value> =
        OcpiResponseBody::failure(err.status(), Some(err.message()), clock);
    json_response(status, headers, &body)
}

fn json_response(
    status: StatusCode,
    mut headers: HeaderMap,
    body: &OcpiResponseBody<Value>,
) -> Response {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, headers, bytes).into_response(),
        Err(e) => {
            error!(error = %e, "could not encode envelope");
            (StatusCode::INTERNAL_SERVER_ERROR, headers).into_response()
        }
    }
}

fn pagination_headers(
    headers: &mut HeaderMap,
    page: &SearchResult<Value>,
    request: &OcpiRequest,
    base_url: &str,
) {
    if let Some(next) = next_offset(page.offset, page.limit, page.total_count) {
        if let Some(link) = next_link(base_url, request, next) {
            if let Ok(value) = HeaderValue::from_str(&format!("<{link}>; rel=\"next\"")) {
                headers.insert(header::LINK, value);
            }
        }
    }
    headers.insert("x-total-count", HeaderValue::from(page.total_count));
    headers.insert("x-limit", HeaderValue::from(page.limit));
}

/// URL of the next page: every query parameter except `offset`, in order
/// and as received, then `offset=<next>`.
pub fn next_link(base_url: &str, request: &OcpiRequest, next: usize) -> Option<String> {
    let mut url = url::Url::parse(&format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        request.path
    ))
    .ok()?;

    let offset = format!("offset={next}");
    let mut pairs: Vec<&str> = request
        .query
        .as_deref()
        .map(|q| {
            q.split('&')
                .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some("offset"))
                .collect()
        })
        .unwrap_or_default();
    pairs.push(&offset);

    url.set_query(Some(&pairs.join("&")));
    Some(url.to_string())
}
