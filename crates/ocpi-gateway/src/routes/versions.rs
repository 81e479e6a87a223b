//! Version discovery.
//!
//! Both documents accept a pending token A as well as an operational token:
//! a partner reads them before its registration completes.

use crate::envelope::{OcpiRequest, OcpiResult, Reply};
use crate::router::AppState;
use axum::{extract::State, response::Response};
use ocpi_types::{Endpoint, InterfaceRole, ModuleId, Version, VersionDetails};

pub async fn get_versions(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let result = versions(&state, &request).await;
    state.respond(result, &request)
}

pub async fn get_version_details(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let result = details(&state, &request).await;
    state.respond(result, &request)
}

async fn versions(state: &AppState, request: &OcpiRequest) -> OcpiResult {
    state.server.authenticate(request.authorization()).await?;
    Reply::data(&vec![Version {
        version: state.platform.version.clone(),
        url: state.platform.version_url(),
    }])
}

async fn details(state: &AppState, request: &OcpiRequest) -> OcpiResult {
    state.server.authenticate(request.authorization()).await?;
    Reply::data(&version_details(state))
}

/// Our details document: `credentials` in both interface roles plus any
/// configured module endpoints.
fn version_details(state: &AppState) -> VersionDetails {
    let credentials_url = state.platform.credentials_url();
    let mut endpoints: Vec<Endpoint> = [InterfaceRole::Sender, InterfaceRole::Receiver]
        .into_iter()
        .map(|role| Endpoint {
            identifier: ModuleId::Credentials,
            role,
            url: credentials_url.clone(),
        })
        .collect();
    endpoints.extend(state.platform.extra_endpoints.iter().cloned());
    VersionDetails {
        version: state.platform.version.clone(),
        endpoints,
    }
}
