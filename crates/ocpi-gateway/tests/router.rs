//! Router tests: full middleware stack, real credentials services, scripted
//! partner.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use ocpi_credentials::adapters::{InMemoryPlatformRegistry, MockTransport, SequentialTokenGenerator};
use ocpi_credentials::{
    CredentialsClientService, CredentialsServerService, LocalPlatform, PendingRegistration,
    PlatformRegistry,
};
use ocpi_gateway::{build_admin_router, build_ocpi_router, AppState, GatewayConfig};
use ocpi_types::{
    authorization_header, BusinessDetails, Clock, CredentialRole, Credentials, Endpoint,
    FixedClock, HttpMethod, InterfaceRole, ModuleId, Role, Version, VersionDetails,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const PUBLIC_URL: &str = "https://us.example.com";
const PARTNER_VERSIONS: &str = "https://partner/versions";
const PARTNER_DETAILS: &str = "https://partner/2.2.1";
const PARTNER_CREDENTIALS: &str = "https://partner/2.2.1/credentials";
const CREDENTIALS_PATH: &str = "/ocpi/2.2.1/credentials";

struct Harness {
    registry: Arc<InMemoryPlatformRegistry>,
    transport: Arc<MockTransport>,
    state: AppState,
    config: GatewayConfig,
}

impl Harness {
    fn new() -> Self {
        let mut config = GatewayConfig::default();
        config.platform.public_url = PUBLIC_URL.to_string();
        config.admin.api_key = Some("admin-key".to_string());

        let registry = Arc::new(InMemoryPlatformRegistry::new());
        let transport = Arc::new(MockTransport::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at("2015-06-30T21:59:59Z"));
        let local = LocalPlatform {
            versions_url: config.platform.versions_url(),
            version: config.platform.version.clone(),
            roles: config.platform.roles.clone(),
        };

        let server = Arc::new(CredentialsServerService::new(
            registry.clone(),
            transport.clone(),
            Arc::new(SequentialTokenGenerator::new("srv")),
            clock.clone(),
            local.clone(),
        ));
        let client = Arc::new(CredentialsClientService::new(
            registry.clone(),
            transport.clone(),
            Arc::new(SequentialTokenGenerator::new("ours")),
            clock.clone(),
            local,
        ));
        let state = AppState::new(server, client, clock, &config);

        Self {
            registry,
            transport,
            state,
            config,
        }
    }

    fn ocpi(&self) -> Router {
        build_ocpi_router(self.state.clone(), &self.config)
    }

    fn admin(&self) -> Router {
        build_admin_router(self.state.clone(), &self.config)
    }

    async fn pending(&self, token: &str) {
        self.registry
            .add_pending(PendingRegistration {
                token: token.to_string(),
                issued_at: self.state.clock.now(),
                expected_url: None,
            })
            .await
            .unwrap();
    }

    fn partner_discovery(&self) {
        self.transport.respond_ok(
            HttpMethod::Get,
            PARTNER_VERSIONS,
            vec![Version {
                version: "2.2.1".to_string(),
                url: PARTNER_DETAILS.to_string(),
            }],
        );
        self.transport.respond_ok(
            HttpMethod::Get,
            PARTNER_DETAILS,
            VersionDetails {
                version: "2.2.1".to_string(),
                endpoints: vec![Endpoint {
                    identifier: ModuleId::Credentials,
                    role: InterfaceRole::Receiver,
                    url: PARTNER_CREDENTIALS.to_string(),
                }],
            },
        );
    }

    /// Registers the partner with token A "A1" and returns our server token.
    async fn registered(&self) -> String {
        self.partner_discovery();
        self.pending("A1").await;
        let response = send(
            self.ocpi(),
            Method::POST,
            CREDENTIALS_PATH,
            Some("A1"),
            Some(partner_credentials("partner-c1")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body(response).await["data"]["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

fn partner_credentials(token: &str) -> Value {
    serde_json::to_value(Credentials {
        token: token.to_string(),
        url: PARTNER_VERSIONS.to_string(),
        roles: vec![CredentialRole {
            role: Role::Cpo,
            business_details: Some(BusinessDetails::named("Partner")),
            party_id: "ABC".to_string(),
            country_code: "FR".to_string(),
        }],
    })
    .unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    json: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, authorization_header(token));
    }
    let body = match json {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[tokio::test]
async fn test_post_registers_partner_and_consumes_token_a() {
    let harness = Harness::new();
    let server_token = harness.registered().await;

    assert_ne!(server_token, "A1");
    let platform = harness
        .registry
        .get_platform(PARTNER_VERSIONS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(platform.server_token.as_deref(), Some(server_token.as_str()));
    assert_eq!(platform.client_token.as_deref(), Some("partner-c1"));
    assert!(harness.registry.find_pending("A1").await.unwrap().is_none());

    // Token A is single use.
    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some("A1"),
        Some(partner_credentials("partner-c2")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Token");
}

#[tokio::test]
async fn test_post_accepts_roles_without_business_details() {
    let harness = Harness::new();
    harness.partner_discovery();
    harness.pending("A1").await;

    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some("A1"),
        Some(json!({
            "token": "partner-c1",
            "url": PARTNER_VERSIONS,
            "roles": [{"country_code": "FR", "party_id": "ABC", "role": "CPO"}]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let platform = harness
        .registry
        .get_platform(PARTNER_VERSIONS)
        .await
        .unwrap()
        .unwrap();
    assert!(platform.server_token.as_deref().is_some_and(|t| t != "A1"));
    assert!(platform.roles[0].business_details.is_none());
    assert!(harness.registry.find_pending("A1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_post_response_carries_our_identity() {
    let harness = Harness::new();
    harness.partner_discovery();
    harness.pending("A1").await;

    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some("A1"),
        Some(partner_credentials("partner-c1")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response).await;
    assert_eq!(json["status_code"], 1000);
    assert_eq!(json["timestamp"], "2015-06-30T21:59:59Z");
    assert_eq!(json["data"]["url"], "https://us.example.com/ocpi/versions");
    assert_eq!(json["data"]["roles"][0]["party_id"], "EXA");
    assert_eq!(harness.state.metrics.snapshot().registrations, 1);
}

#[tokio::test]
async fn test_bogus_token_is_rejected_with_challenge() {
    let harness = Harness::new();
    let response = send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, Some("bogus"), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Token");
    let json = body(response).await;
    assert_eq!(json["status_code"], 2000);
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let harness = Harness::new();
    let response = send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_is_idempotent() {
    let harness = Harness::new();
    let token = harness.registered().await;

    let first = body(send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, Some(&token), None).await).await;
    let second = body(send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, Some(&token), None).await).await;
    assert_eq!(first["status_code"], 1000);
    assert_eq!(first["data"], second["data"]);
    assert_eq!(first["data"]["token"], token.as_str());
}

#[tokio::test]
async fn test_put_rotates_server_token() {
    let harness = Harness::new();
    let old = harness.registered().await;

    let response = send(
        harness.ocpi(),
        Method::PUT,
        CREDENTIALS_PATH,
        Some(&old),
        Some(partner_credentials("partner-c2")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let new = body(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(new, old);

    let response = send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, Some(&old), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, Some(&new), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_then_get_is_unauthenticated() {
    let harness = Harness::new();
    let token = harness.registered().await;

    let response = send(harness.ocpi(), Method::DELETE, CREDENTIALS_PATH, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response).await;
    assert_eq!(json["status_code"], 1000);
    assert!(json["data"].is_null());

    let response = send(harness.ocpi(), Method::GET, CREDENTIALS_PATH, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_operational_token_cannot_post() {
    let harness = Harness::new();
    let token = harness.registered().await;

    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some(&token),
        Some(partner_credentials("partner-c3")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// DECODING AND VALIDATION
// =============================================================================

#[tokio::test]
async fn test_invalid_credentials_are_2001() {
    let harness = Harness::new();
    harness.pending("A1").await;
    let mut credentials = partner_credentials("partner-c1");
    credentials["roles"] = json!([]);

    let response = send(harness.ocpi(), Method::POST, CREDENTIALS_PATH, Some("A1"), Some(credentials)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["status_code"], 2001);
    // A rejected body does not consume token A.
    assert!(harness.registry.find_pending("A1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_undecodable_body_is_400_envelope() {
    let harness = Harness::new();
    harness.pending("A1").await;

    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some("A1"),
        Some(json!({"token": 42})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body(response).await["status_code"], 2000);
}

#[tokio::test]
async fn test_undecodable_body_without_token_is_401() {
    let harness = Harness::new();
    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some("bogus"),
        Some(json!({"token": 42})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unreachable_partner_is_502() {
    let harness = Harness::new();
    harness.pending("A1").await;

    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some("A1"),
        Some(partner_credentials("partner-c1")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body(response).await["status_code"], 3001);
}

// =============================================================================
// VERSIONS, IDS, FALLBACK
// =============================================================================

#[tokio::test]
async fn test_versions_accept_token_a() {
    let harness = Harness::new();
    harness.pending("A1").await;

    let response = send(harness.ocpi(), Method::GET, "/ocpi/versions", Some("A1"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response).await;
    assert_eq!(json["data"][0]["version"], "2.2.1");
    assert_eq!(json["data"][0]["url"], "https://us.example.com/ocpi/2.2.1");

    let response = send(harness.ocpi(), Method::GET, "/ocpi/2.2.1", Some("A1"), None).await;
    let json = body(response).await;
    let endpoints = json["data"]["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0]["identifier"], "credentials");
    assert_eq!(
        endpoints[0]["url"],
        "https://us.example.com/ocpi/2.2.1/credentials"
    );
}

#[tokio::test]
async fn test_versions_require_a_token() {
    let harness = Harness::new();
    let response = send(harness.ocpi(), Method::GET, "/ocpi/versions", Some("bogus"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_ids_are_echoed_or_generated() {
    let harness = Harness::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = harness.ocpi().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
    assert!(response.headers().contains_key("x-correlation-id"));

    let response = send(harness.ocpi(), Method::GET, "/health", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unsupported_method_is_405_envelope() {
    let harness = Harness::new();
    for (method, path) in [
        (Method::PATCH, CREDENTIALS_PATH),
        (Method::POST, "/ocpi/versions"),
        (Method::DELETE, "/ocpi/2.2.1"),
    ] {
        let response = send(harness.ocpi(), method.clone(), path, Some("bogus"), None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {path}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let json = body(response).await;
        assert_eq!(json["status_code"], 2000);
        assert!(json["data"].is_null());
        assert_eq!(json["timestamp"], "2015-06-30T21:59:59Z");
    }
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let harness = Harness::new();
    let response = send(harness.ocpi(), Method::GET, "/ocpi/2.1.1/credentials", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(response).await["status_code"], 2000);
}

// =============================================================================
// ADMIN
// =============================================================================

async fn admin_send(harness: &Harness, method: Method, uri: &str, json: Option<Value>) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", "admin-key");
    let body = match json {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    harness.admin().oneshot(builder.body(body).unwrap()).await.unwrap()
}

#[tokio::test]
async fn test_admin_requires_api_key() {
    let harness = Harness::new();
    let response = send(harness.admin(), Method::POST, "/admin/token-a", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Health stays open.
    let response = send(harness.admin(), Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_issued_token_a_registers_partner() {
    let harness = Harness::new();
    let response = admin_send(&harness, Method::POST, "/admin/token-a", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response).await;
    let token_a = json["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["versions_url"], "https://us.example.com/ocpi/versions");

    harness.partner_discovery();
    let response = send(
        harness.ocpi(),
        Method::POST,
        CREDENTIALS_PATH,
        Some(&token_a),
        Some(partner_credentials("partner-c1")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.state.metrics.snapshot().tokens_issued, 1);
}

#[tokio::test]
async fn test_admin_register_and_snapshot() {
    let harness = Harness::new();
    harness.partner_discovery();
    harness.transport.respond_ok(
        HttpMethod::Post,
        PARTNER_CREDENTIALS,
        serde_json::from_value::<Credentials>(partner_credentials("partner-c1")).unwrap(),
    );

    let response = admin_send(
        &harness,
        Method::POST,
        "/admin/partners",
        Some(json!({"versions_url": PARTNER_VERSIONS, "token_a": "THEIR-A"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response).await;
    assert_eq!(json["data"]["state"], "REGISTERED");
    assert_ne!(json["data"]["client_token"], "partner-c1");

    // The POST authenticated with the partner's token A.
    let sent = harness
        .transport
        .requests_to(HttpMethod::Post, PARTNER_CREDENTIALS);
    assert_eq!(
        sent[0].header("authorization"),
        Some(authorization_header("THEIR-A").as_str())
    );

    let response = admin_send(
        &harness,
        Method::GET,
        "/admin/partners?versions_url=https%3A%2F%2Fpartner%2Fversions",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["url"], PARTNER_VERSIONS);
}

#[tokio::test]
async fn test_admin_unknown_partner_is_404() {
    let harness = Harness::new();
    let response = admin_send(
        &harness,
        Method::GET,
        "/admin/partners?versions_url=https%3A%2F%2Fnobody%2Fversions",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = admin_send(&harness, Method::GET, "/admin/partners?versions_url=", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["status_code"], 2001);
}

#[tokio::test]
async fn test_admin_lists_partners_in_pages() {
    let harness = Harness::new();
    for name in ["c", "a", "b"] {
        harness
            .registry
            .save_token_a(&format!("https://{name}/versions"), "THEIR-A")
            .await
            .unwrap();
    }

    let response = admin_send(&harness, Method::GET, "/admin/partners?limit=2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "3");
    assert_eq!(response.headers()["x-limit"], "2");
    assert_eq!(
        response.headers()[header::LINK],
        "<https://us.example.com/admin/partners?limit=2&offset=2>; rel=\"next\""
    );
    let json = body(response).await;
    let urls: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["url"].as_str().unwrap())
        .collect();
    assert_eq!(urls, ["https://a/versions", "https://b/versions"]);
    assert_eq!(json["data"][0]["state"], "PENDING");

    let response = admin_send(&harness, Method::GET, "/admin/partners?limit=2&offset=2", None).await;
    assert!(response.headers().get(header::LINK).is_none());
    assert_eq!(body(response).await["data"][0]["url"], "https://c/versions");

    // Limits above the configured maximum are clamped.
    let response = admin_send(&harness, Method::GET, "/admin/partners?limit=5000", None).await;
    assert_eq!(response.headers()["x-limit"], "1000");

    let response = admin_send(&harness, Method::GET, "/admin/partners?limit=many", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["status_code"], 2001);
}

#[tokio::test]
async fn test_admin_unsupported_method_is_405_envelope() {
    let harness = Harness::new();
    let response = admin_send(&harness, Method::PATCH, "/admin/partners", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body(response).await["status_code"], 2000);
}

#[tokio::test]
async fn test_admin_unregister_without_relationship() {
    let harness = Harness::new();
    let response = admin_send(
        &harness,
        Method::DELETE,
        "/admin/partners",
        Some(json!({"versions_url": PARTNER_VERSIONS})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
