//! # Integration Test Flows
//!
//! Two (or three) platforms built from the real services and routers:
//!
//! 1. **Registration**: the sender's admin API drives `POST /credentials`
//!    against the receiver, which calls back into the sender's versions
//!    endpoint with the token it was just offered
//! 2. **Rotation**: `PUT /credentials` replaces the tokens in both directions
//! 3. **Unregistration**: `DELETE /credentials` ends the relationship on both sides
//! 4. **Token A**: single use, also under concurrent registrations

use axum::http::{Method, StatusCode};
use ocpi_credentials::{PlatformRegistry, RegistrationState};
use ocpi_types::Role;
use serde_json::{json, Value};

use crate::harness::{Network, TestPlatform};

// =============================================================================
// TEST FIXTURES
// =============================================================================

/// Receiver (CPO) and sender (eMSP).
fn pair() -> (Network, TestPlatform, TestPlatform) {
    let network = Network::new();
    let alpha = network.join("alpha.test", Role::Cpo, "NL", "ALP");
    let beta = network.join("beta.test", Role::Emsp, "DE", "BET");
    (network, alpha, beta)
}

/// Beta registers with Alpha. Returns the token A used.
async fn registered(alpha: &TestPlatform, beta: &TestPlatform) -> String {
    let token_a = alpha.issue_token_a().await;
    let (status, body) = beta.register_with(alpha, &token_a).await;
    assert_eq!(status, StatusCode::OK, "registration failed: {body}");
    token_a
}

fn credentials_body(platform: &TestPlatform, token: &str) -> Value {
    json!({
        "token": token,
        "url": platform.versions_url(),
        "roles": [{
            "role": "EMSP",
            "party_id": "BET",
            "country_code": "DE",
            "business_details": {"name": "beta"}
        }]
    })
}

/// Token Beta presents to Alpha.
async fn beta_client_token(alpha: &TestPlatform, beta: &TestPlatform) -> String {
    beta.record_of(alpha)
        .await
        .and_then(|p| p.client_token)
        .expect("beta holds a client token")
}

/// Token Alpha presents to Beta.
async fn alpha_client_token(alpha: &TestPlatform, beta: &TestPlatform) -> String {
    alpha
        .record_of(beta)
        .await
        .and_then(|p| p.client_token)
        .expect("alpha holds a client token")
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[tokio::test]
async fn test_registration_links_both_registries() {
    let (_network, alpha, beta) = pair();
    let token_a = alpha.issue_token_a().await;

    let (status, body) = beta.register_with(&alpha, &token_a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "REGISTERED");
    assert_eq!(body["data"]["version"], "2.2.1");

    let alpha_view = alpha.record_of(&beta).await.unwrap();
    let beta_view = beta.record_of(&alpha).await.unwrap();

    // Each side's server token is the other side's client token.
    assert!(alpha_view.server_token.is_some());
    assert!(beta_view.server_token.is_some());
    assert_eq!(alpha_view.server_token, beta_view.client_token);
    assert_eq!(alpha_view.client_token, beta_view.server_token);
    assert_ne!(alpha_view.server_token.as_deref(), Some(token_a.as_str()));

    assert_eq!(alpha_view.roles[0].party_id, "BET");
    assert_eq!(beta_view.roles[0].party_id, "ALP");
    assert_eq!(alpha_view.version.as_deref(), Some("2.2.1"));
    assert!(beta_view.staged_server_token.is_none());
    assert!(beta_view.token_a.is_none());
    assert_eq!(alpha.registry.pending_count(), 0);

    assert_eq!(alpha.state.metrics.snapshot().registrations, 1);
    assert_eq!(beta.state.metrics.snapshot().registrations, 1);
}

#[tokio::test]
async fn test_tokens_work_in_both_directions() {
    let (_network, alpha, beta) = pair();
    registered(&alpha, &beta).await;

    let token = beta_client_token(&alpha, &beta).await;
    let (status, body) = alpha
        .ocpi(Method::GET, &alpha.credentials_path(), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], alpha.versions_url());
    assert_eq!(body["data"]["token"], token.as_str());

    let token = alpha_client_token(&alpha, &beta).await;
    let (status, body) = beta
        .ocpi(Method::GET, "/ocpi/versions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["url"], "https://beta.test/ocpi/2.2.1");
}

#[tokio::test]
async fn test_token_a_is_single_use() {
    let (_network, alpha, beta) = pair();
    let token_a = registered(&alpha, &beta).await;

    let (status, _) = alpha
        .ocpi(Method::GET, "/ocpi/versions", Some(&token_a), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = alpha
        .ocpi(
            Method::POST,
            &alpha.credentials_path(),
            Some(&token_a),
            Some(credentials_body(&beta, "another-token")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status_code"], 2000);
}

#[tokio::test]
async fn test_admin_reads_partner_credentials() {
    let (_network, alpha, beta) = pair();
    registered(&alpha, &beta).await;

    let uri = format!(
        "/admin/partners/credentials?versions_url={}",
        "https%3A%2F%2Falpha.test%2Focpi%2Fversions"
    );
    let (status, body) = beta.admin(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], alpha.versions_url());
    assert_eq!(body["data"]["roles"][0]["party_id"], "ALP");
    let shown = body["data"]["token"].as_str().unwrap();
    assert_ne!(shown, beta_client_token(&alpha, &beta).await);
}

#[tokio::test]
async fn test_unreachable_partner_leaves_no_active_token() {
    let (network, alpha, beta) = pair();
    let token_a = alpha.issue_token_a().await;
    network.transport.unmount("alpha.test");

    let (status, body) = beta.register_with(&alpha, &token_a).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status_code"], 3001);

    let beta_view = beta.record_of(&alpha).await.unwrap();
    assert_eq!(beta_view.state(), RegistrationState::Pending);
    assert!(beta_view.server_token.is_none());
    assert!(beta_view.staged_server_token.is_none());
    // Token A was never presented, so it is still usable.
    assert_eq!(alpha.registry.pending_count(), 1);
}

// =============================================================================
// ROTATION
// =============================================================================

#[tokio::test]
async fn test_update_rotates_both_directions() {
    let (_network, alpha, beta) = pair();
    registered(&alpha, &beta).await;
    let old_beta_token = beta_client_token(&alpha, &beta).await;
    let old_alpha_token = alpha_client_token(&alpha, &beta).await;

    let (status, body) = beta
        .admin(
            Method::PUT,
            "/admin/partners",
            Some(json!({"versions_url": alpha.versions_url()})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "update failed: {body}");

    let new_beta_token = beta_client_token(&alpha, &beta).await;
    let new_alpha_token = alpha_client_token(&alpha, &beta).await;
    assert_ne!(new_beta_token, old_beta_token);
    assert_ne!(new_alpha_token, old_alpha_token);

    let path = alpha.credentials_path();
    let (status, _) = alpha.ocpi(Method::GET, &path, Some(&old_beta_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = alpha.ocpi(Method::GET, &path, Some(&new_beta_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let path = beta.credentials_path();
    let (status, _) = beta.ocpi(Method::GET, &path, Some(&old_alpha_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = beta.ocpi(Method::GET, &path, Some(&new_alpha_token), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(alpha.state.metrics.snapshot().rotations, 1);
}

#[tokio::test]
async fn test_update_without_registration_is_404() {
    let (_network, alpha, beta) = pair();
    let (status, _) = beta
        .admin(
            Method::PUT,
            "/admin/partners",
            Some(json!({"versions_url": alpha.versions_url()})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// UNREGISTRATION
// =============================================================================

#[tokio::test]
async fn test_unregister_ends_relationship_on_both_sides() {
    let (_network, alpha, beta) = pair();
    registered(&alpha, &beta).await;
    let beta_token = beta_client_token(&alpha, &beta).await;
    let alpha_token = alpha_client_token(&alpha, &beta).await;

    let (status, body) = beta
        .admin(
            Method::DELETE,
            "/admin/partners",
            Some(json!({"versions_url": alpha.versions_url()})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, _) = alpha
        .ocpi(Method::GET, &alpha.credentials_path(), Some(&beta_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = beta
        .ocpi(Method::GET, &beta.credentials_path(), Some(&alpha_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(
        alpha.record_of(&beta).await.unwrap().state(),
        RegistrationState::Unregistered
    );
    assert_eq!(
        beta.record_of(&alpha).await.unwrap().state(),
        RegistrationState::Unregistered
    );
}

#[tokio::test]
async fn test_reregistration_after_unregister() {
    let (_network, alpha, beta) = pair();
    registered(&alpha, &beta).await;
    let (status, _) = beta
        .admin(
            Method::DELETE,
            "/admin/partners",
            Some(json!({"versions_url": alpha.versions_url()})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    registered(&alpha, &beta).await;
    let record = alpha.record_of(&beta).await.unwrap();
    assert_eq!(record.state(), RegistrationState::Registered);
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[tokio::test]
async fn test_concurrent_registrations_share_one_token_a() {
    let network = Network::new();
    let alpha = network.join("alpha.test", Role::Cpo, "NL", "ALP");
    let beta = network.join("beta.test", Role::Emsp, "DE", "BET");
    let gamma = network.join("gamma.test", Role::Emsp, "FR", "GAM");
    let token_a = alpha.issue_token_a().await;

    let ((beta_status, _), (gamma_status, _)) = tokio::join!(
        beta.register_with(&alpha, &token_a),
        gamma.register_with(&alpha, &token_a),
    );

    let mut statuses = [beta_status, gamma_status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_GATEWAY]);

    let registered_at_alpha = [
        alpha.record_of(&beta).await,
        alpha.record_of(&gamma).await,
    ]
    .into_iter()
    .flatten()
    .filter(|p| p.is_registered())
    .count();
    assert_eq!(registered_at_alpha, 1);
    assert_eq!(alpha.registry.pending_count(), 0);

    // The loser's offered token does not authenticate anywhere.
    let loser = if beta_status == StatusCode::OK { &gamma } else { &beta };
    let record = loser.record_of(&alpha).await.unwrap();
    assert!(record.server_token.is_none());
    assert!(record.staged_server_token.is_none());
    assert!(loser
        .registry
        .find_by_server_token(&format!("{}-1", loser.host))
        .await
        .unwrap()
        .is_none());
}
