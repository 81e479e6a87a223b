//! The credentials module, receiver side.
//!
//! Authentication, validation and registry updates all happen in
//! [`CredentialsServerApi`](ocpi_credentials::CredentialsServerApi); these
//! handlers decode the body, count lifecycle events and render the envelope.

use crate::envelope::{OcpiRequest, OcpiResult, Reply};
use crate::middleware::LifecycleEvent;
use crate::router::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use ocpi_types::{Credentials, OcpiError};

type CredentialsBody = Result<Json<Credentials>, JsonRejection>;

/// The decoded body. An undecodable body from an unauthenticated caller is
/// reported as an authentication failure.
async fn decode(
    state: &AppState,
    request: &OcpiRequest,
    body: CredentialsBody,
) -> Result<Credentials, OcpiError> {
    match body {
        Ok(Json(credentials)) => Ok(credentials),
        Err(rejection) => {
            state.server.authenticate(request.authorization()).await?;
            Err(OcpiError::Decode(rejection.body_text()))
        }
    }
}

pub async fn get_credentials(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let result = get(&state, &request).await;
    state.respond(result, &request)
}

pub async fn post_credentials(
    State(state): State<AppState>,
    request: OcpiRequest,
    body: CredentialsBody,
) -> Response {
    let result = post(&state, &request, body).await;
    state.respond(result, &request)
}

pub async fn put_credentials(
    State(state): State<AppState>,
    request: OcpiRequest,
    body: CredentialsBody,
) -> Response {
    let result = put(&state, &request, body).await;
    state.respond(result, &request)
}

pub async fn delete_credentials(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let result = delete(&state, &request).await;
    state.respond(result, &request)
}

async fn get(state: &AppState, request: &OcpiRequest) -> OcpiResult {
    let ours = state.server.get_credentials(request.authorization()).await?;
    Reply::data(&ours)
}

async fn post(state: &AppState, request: &OcpiRequest, body: CredentialsBody) -> OcpiResult {
    let theirs = decode(state, request, body).await?;
    let ours = state
        .server
        .post_credentials(request.authorization(), theirs)
        .await?;
    state.metrics.record(LifecycleEvent::Registered);
    Reply::data(&ours)
}

async fn put(state: &AppState, request: &OcpiRequest, body: CredentialsBody) -> OcpiResult {
    let theirs = decode(state, request, body).await?;
    let ours = state
        .server
        .put_credentials(request.authorization(), theirs)
        .await?;
    state.metrics.record(LifecycleEvent::Rotated);
    Reply::data(&ours)
}

async fn delete(state: &AppState, request: &OcpiRequest) -> OcpiResult {
    state
        .server
        .delete_credentials(request.authorization())
        .await?;
    state.metrics.record(LifecycleEvent::Unregistered);
    Ok(Reply::Empty)
}
