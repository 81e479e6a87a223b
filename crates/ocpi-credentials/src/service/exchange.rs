//! One request/response cycle with a partner, unwrapped from its envelope.

use ocpi_types::{HttpRequest, OcpiResponseBody};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::CredentialsError;
use crate::ports::TransportClient;

/// Send `request` and return the envelope's `data`.
///
/// Transport failures become `UnreachablePartner`, undecodable bodies
/// `MalformedDiscoveryDocument` and non-success status codes
/// `RegistrationRejected`.
pub(crate) async fn exchange<T: DeserializeOwned>(
    transport: &dyn TransportClient,
    request: HttpRequest,
) -> Result<Option<T>, CredentialsError> {
    let url = request.url.clone();
    let method = request.method;
    let response = transport
        .send(request)
        .await
        .map_err(|e| CredentialsError::UnreachablePartner {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    debug!(%method, %url, http_status = response.status, "partner responded");

    let envelope: OcpiResponseBody<T> =
        response
            .parse_body()
            .map_err(|e| CredentialsError::MalformedDiscoveryDocument {
                url: url.clone(),
                reason: format!("HTTP {}: {e}", response.status),
            })?;

    if !envelope.is_success() {
        return Err(CredentialsError::RegistrationRejected {
            url,
            status_code: envelope.status_code,
            message: envelope.status_message.unwrap_or_default(),
        });
    }
    Ok(envelope.data)
}

/// Like [`exchange`], but a success envelope must carry data.
pub(crate) async fn exchange_data<T: DeserializeOwned>(
    transport: &dyn TransportClient,
    request: HttpRequest,
) -> Result<T, CredentialsError> {
    let url = request.url.clone();
    exchange(transport, request)
        .await?
        .ok_or_else(|| CredentialsError::MalformedDiscoveryDocument {
            url,
            reason: "success envelope without data".to_string(),
        })
}
