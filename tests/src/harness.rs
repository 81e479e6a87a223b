//! In-process OCPI network.
//!
//! Every [`TestPlatform`] owns a registry, both credentials services and the
//! gateway routers. Outbound calls go through one shared [`RouterTransport`],
//! which hands each request to the router mounted for the URL's host.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use ocpi_credentials::adapters::{InMemoryPlatformRegistry, SequentialTokenGenerator};
use ocpi_credentials::{
    CredentialsClientService, CredentialsServerService, LocalPlatform, Platform,
    PlatformRegistry, TokenGenerator, TransportClient, TransportError,
};
use ocpi_gateway::{build_admin_router, build_ocpi_router, AppState, GatewayConfig};
use ocpi_types::{
    authorization_header, BusinessDetails, Clock, CredentialRole, FixedClock, HttpRequest,
    HttpResponse, Role,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tower::ServiceExt;

/// `TransportClient` that dispatches to mounted routers by host.
#[derive(Default)]
pub struct RouterTransport {
    routes: RwLock<HashMap<String, Router>>,
}

impl RouterTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `host` with `router`.
    pub fn mount(&self, host: &str, router: Router) {
        self.routes.write().insert(host.to_string(), router);
    }

    /// Take `host` off the network.
    pub fn unmount(&self, host: &str) {
        self.routes.write().remove(host);
    }
}

fn host_of(raw: &str) -> Result<String, TransportError> {
    let parsed = url::Url::parse(raw).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| TransportError::InvalidUrl(format!("{raw} has no host")))
}

#[async_trait]
impl TransportClient for RouterTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let host = host_of(&request.url)?;
        let router = self
            .routes
            .read()
            .get(&host)
            .cloned()
            .ok_or_else(|| TransportError::Connect(format!("no platform at {host}")))?;

        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = request.body.map(Body::from).unwrap_or_else(Body::empty);
        let http_request = builder
            .body(body)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let response = router
            .oneshot(http_request)
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// One platform on the in-process network.
pub struct TestPlatform {
    pub host: String,
    pub registry: Arc<InMemoryPlatformRegistry>,
    pub state: AppState,
    pub config: GatewayConfig,
}

impl TestPlatform {
    fn new(
        host: &str,
        role: CredentialRole,
        transport: Arc<RouterTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut config = GatewayConfig::default();
        config.platform.public_url = format!("https://{host}");
        config.platform.roles = vec![role];

        let registry = Arc::new(InMemoryPlatformRegistry::new());
        // One source per platform, so the two roles never hand out the same token.
        let tokens: Arc<dyn TokenGenerator> = Arc::new(SequentialTokenGenerator::new(host));
        let local = LocalPlatform {
            versions_url: config.platform.versions_url(),
            version: config.platform.version.clone(),
            roles: config.platform.roles.clone(),
        };

        let server = Arc::new(CredentialsServerService::new(
            registry.clone(),
            transport.clone(),
            Arc::clone(&tokens),
            Arc::clone(&clock),
            local.clone(),
        ));
        let client = Arc::new(CredentialsClientService::new(
            registry.clone(),
            transport,
            tokens,
            Arc::clone(&clock),
            local,
        ));
        let state = AppState::new(server, client, clock, &config);

        Self {
            host: host.to_string(),
            registry,
            state,
            config,
        }
    }

    pub fn versions_url(&self) -> String {
        self.config.platform.versions_url()
    }

    /// Path of our credentials module.
    pub fn credentials_path(&self) -> String {
        format!("/ocpi/{}/credentials", self.config.platform.version)
    }

    pub fn ocpi_router(&self) -> Router {
        build_ocpi_router(self.state.clone(), &self.config)
    }

    pub fn admin_router(&self) -> Router {
        build_admin_router(self.state.clone(), &self.config)
    }

    /// Partner-facing call with an optional OCPI token.
    pub async fn ocpi(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let auth = token.map(authorization_header);
        call(self.ocpi_router(), method, uri, auth, body).await
    }

    /// Operator call.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        call(self.admin_router(), method, uri, None, body).await
    }

    /// Issue a token A through the admin API.
    pub async fn issue_token_a(&self) -> String {
        let (status, body) = self.admin(Method::POST, "/admin/token-a", None).await;
        assert_eq!(status, StatusCode::OK, "token A not issued: {body}");
        body["data"]["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    /// Register with `partner` through the admin API.
    pub async fn register_with(&self, partner: &TestPlatform, token_a: &str) -> (StatusCode, Value) {
        self.admin(
            Method::POST,
            "/admin/partners",
            Some(json!({"versions_url": partner.versions_url(), "token_a": token_a})),
        )
        .await
    }

    /// Our record of `partner`.
    pub async fn record_of(&self, partner: &TestPlatform) -> Option<Platform> {
        self.registry
            .get_platform(&partner.versions_url())
            .await
            .expect("in-memory registry does not fail")
    }
}

async fn call(
    router: Router,
    method: Method,
    uri: &str,
    authorization: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// A set of platforms sharing one transport and one clock.
pub struct Network {
    pub transport: Arc<RouterTransport>,
    clock: Arc<dyn Clock>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self {
            transport: Arc::new(RouterTransport::new()),
            clock: Arc::new(FixedClock::at("2015-06-30T21:59:59Z")),
        }
    }

    /// Add a platform at `https://<host>` hosting one role.
    pub fn join(&self, host: &str, role: Role, country_code: &str, party_id: &str) -> TestPlatform {
        let role = CredentialRole {
            role,
            business_details: Some(BusinessDetails::named(format!("{host} operator"))),
            party_id: party_id.to_string(),
            country_code: country_code.to_string(),
        };
        let platform = TestPlatform::new(
            host,
            role,
            Arc::clone(&self.transport),
            Arc::clone(&self.clock),
        );
        self.transport.mount(host, platform.ocpi_router());
        platform
    }
}
