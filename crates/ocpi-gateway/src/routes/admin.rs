//! Operator API on the admin listener.
//!
//! Issues registration tokens and drives the sender side of the credentials
//! module. Stored tokens are only ever returned redacted; the one exception
//! is a freshly issued token A, which the operator must hand to the partner.

use crate::envelope::{OcpiRequest, OcpiResult, Reply};
use crate::middleware::LifecycleEvent;
use crate::router::AppState;
use axum::{body::Bytes, extract::State, response::Response};
use chrono::{DateTime, Utc};
use ocpi_credentials::{Platform, RegistrationState};
use ocpi_types::{redact, CredentialRole, Credentials, Endpoint, OcpiError, SearchResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

/// Body of `POST /admin/token-a`. May be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueTokenRequest {
    /// Versions URL of the partner the token is meant for.
    #[serde(default)]
    pub expected_url: Option<String>,
}

/// A freshly issued token A.
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Our versions URL, handed to the partner along with the token.
    pub versions_url: String,
}

/// Body of `POST /admin/partners`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub versions_url: String,
    pub token_a: String,
}

/// Body of `PUT` and `DELETE /admin/partners`.
#[derive(Debug, Deserialize)]
pub struct PartnerRequest {
    pub versions_url: String,
}

/// Stored view of a partner with its tokens redacted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerSnapshot {
    pub url: String,
    pub state: RegistrationState,
    pub version: Option<String>,
    pub endpoints: Vec<Endpoint>,
    pub roles: Vec<CredentialRole>,
    pub token_a: Option<String>,
    pub client_token: Option<String>,
    pub server_token: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Platform> for PartnerSnapshot {
    fn from(platform: &Platform) -> Self {
        Self {
            url: platform.url.clone(),
            state: platform.state(),
            version: platform.version.clone(),
            endpoints: platform.endpoints.clone().unwrap_or_default(),
            roles: platform.roles.clone(),
            token_a: platform.token_a.as_deref().map(redact),
            client_token: platform.client_token.as_deref().map(redact),
            server_token: platform.server_token.as_deref().map(redact),
            registered_at: platform.registered_at,
            updated_at: platform.updated_at,
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, OcpiError> {
    serde_json::from_slice(body).map_err(|e| OcpiError::Decode(e.to_string()))
}

fn required_url(url: &str) -> Result<&str, OcpiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(OcpiError::Validation("versions_url must not be empty".to_string()));
    }
    Ok(url)
}

fn versions_url_param(request: &OcpiRequest) -> Result<String, OcpiError> {
    request
        .query_param("versions_url")
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| OcpiError::Validation("query parameter versions_url is required".to_string()))
}

async fn snapshot(state: &AppState, url: &str) -> OcpiResult {
    let platform = state
        .client
        .partner(url)
        .await?
        .ok_or_else(|| OcpiError::NotFound(format!("no record for {url}")))?;
    Reply::data(&PartnerSnapshot::from(&platform))
}

pub async fn issue_token_a(
    State(state): State<AppState>,
    request: OcpiRequest,
    body: Bytes,
) -> Response {
    let result = issue(&state, &body).await;
    state.respond(result, &request)
}

async fn issue(state: &AppState, body: &Bytes) -> OcpiResult {
    let params: IssueTokenRequest = if body.is_empty() {
        IssueTokenRequest::default()
    } else {
        parse_body(body)?
    };
    let token = state.server.issue_token_a(params.expected_url).await?;
    state.metrics.record(LifecycleEvent::TokenIssued);
    Reply::data(&IssuedToken {
        token,
        versions_url: state.platform.versions_url(),
    })
}

pub async fn register_partner(
    State(state): State<AppState>,
    request: OcpiRequest,
    body: Bytes,
) -> Response {
    let result = register(&state, &body).await;
    state.respond(result, &request)
}

async fn register(state: &AppState, body: &Bytes) -> OcpiResult {
    let params: RegisterRequest = parse_body(body)?;
    let url = required_url(&params.versions_url)?;
    if params.token_a.is_empty() {
        return Err(OcpiError::Validation("token_a must not be empty".to_string()));
    }
    state.client.register(url, &params.token_a).await?;
    state.metrics.record(LifecycleEvent::Registered);
    info!(platform_url = %url, "registration with partner completed");
    snapshot(state, url).await
}

pub async fn update_partner(
    State(state): State<AppState>,
    request: OcpiRequest,
    body: Bytes,
) -> Response {
    let result = update(&state, &body).await;
    state.respond(result, &request)
}

async fn update(state: &AppState, body: &Bytes) -> OcpiResult {
    let params: PartnerRequest = parse_body(body)?;
    let url = required_url(&params.versions_url)?;
    state.client.update(url).await?;
    state.metrics.record(LifecycleEvent::Rotated);
    snapshot(state, url).await
}

pub async fn unregister_partner(
    State(state): State<AppState>,
    request: OcpiRequest,
    body: Bytes,
) -> Response {
    let result = unregister(&state, &body).await;
    state.respond(result, &request)
}

async fn unregister(state: &AppState, body: &Bytes) -> OcpiResult {
    let params: PartnerRequest = parse_body(body)?;
    let url = required_url(&params.versions_url)?;
    state.client.unregister(url).await?;
    state.metrics.record(LifecycleEvent::Unregistered);
    Ok(Reply::Empty)
}

/// `GET /admin/partners`: one partner with `versions_url`, otherwise a page
/// of all of them.
pub async fn get_partner(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let result = if request.query_param("versions_url").is_some() {
        match versions_url_param(&request) {
            Ok(url) => snapshot(&state, &url).await,
            Err(e) => Err(e),
        }
    } else {
        list_partners(&state, &request).await
    };
    state.respond(result, &request)
}

async fn list_partners(state: &AppState, request: &OcpiRequest) -> OcpiResult {
    let params = request.pagination(&state.pagination)?;
    let partners: Vec<PartnerSnapshot> = state
        .client
        .partners()
        .await?
        .iter()
        .map(PartnerSnapshot::from)
        .collect();
    Reply::page(SearchResult::from_slice(&partners, params))
}

pub async fn get_partner_credentials(
    State(state): State<AppState>,
    request: OcpiRequest,
) -> Response {
    let result = partner_credentials(&state, &request).await;
    state.respond(result, &request)
}

async fn partner_credentials(state: &AppState, request: &OcpiRequest) -> OcpiResult {
    let url = versions_url_param(request)?;
    let credentials = state.client.get(&url).await?;
    Reply::data(&Credentials {
        token: redact(&credentials.token),
        ..credentials
    })
}

pub async fn stats(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let result = Reply::data(&state.metrics.snapshot());
    state.respond(result, &request)
}

/// Prometheus text exposition.
#[cfg(feature = "metrics")]
pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    use axum::response::IntoResponse;
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        state.metrics.to_prometheus(),
    )
        .into_response()
}
