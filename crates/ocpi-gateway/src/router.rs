//! Router assembly and shared handler state.

use crate::domain::config::{GatewayConfig, PaginationConfig, PlatformConfig};
use crate::envelope::{render, OcpiRequest, OcpiResult};
use crate::middleware::{
    catch_panic_layer, create_cors_layer, AdminAuthLayer, GatewayMetrics, RequestIdLayer,
    TimeoutLayer, TracingLayer,
};
use crate::routes::{admin, credentials, health, versions};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Response,
    routing::{get, post},
    Router,
};
use ocpi_credentials::{CredentialsClientApi, CredentialsServerApi};
use ocpi_types::{Clock, OcpiError};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<dyn CredentialsServerApi>,
    pub client: Arc<dyn CredentialsClientApi>,
    pub clock: Arc<dyn Clock>,
    pub platform: Arc<PlatformConfig>,
    pub pagination: PaginationConfig,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(
        server: Arc<dyn CredentialsServerApi>,
        client: Arc<dyn CredentialsClientApi>,
        clock: Arc<dyn Clock>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            server,
            client,
            clock,
            platform: Arc::new(config.platform.clone()),
            pagination: config.pagination.clone(),
            metrics: Arc::new(GatewayMetrics::new()),
        }
    }

    /// Render a handler result with this state's clock and public URL.
    pub fn respond(&self, result: OcpiResult, request: &OcpiRequest) -> Response {
        render(
            result,
            request,
            &self.platform.public_url,
            self.clock.as_ref(),
        )
    }
}

async fn fallback(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let err = OcpiError::NotFound(format!("no route for {} {}", request.method, request.path));
    state.respond(Err(err), &request)
}

/// Known path, unsupported method.
async fn method_not_allowed(State(state): State<AppState>, request: OcpiRequest) -> Response {
    let err = OcpiError::Conflict(format!(
        "method {} is not allowed on {}",
        request.method, request.path
    ));
    state.respond(Err(err), &request)
}

/// Wrap `router` in the middleware shared by both listeners.
fn with_common_layers(router: Router, state: &AppState, config: &GatewayConfig) -> Router {
    let router = router
        .layer(catch_panic_layer(
            Arc::clone(&state.clock),
            Arc::clone(&state.metrics),
        ))
        .layer(DefaultBodyLimit::max(config.limits.max_body_size));

    let router = match create_cors_layer(&config.cors) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(RequestIdLayer::new())
            .layer(TracingLayer::new(Arc::clone(&state.metrics)))
            .layer(TimeoutLayer::new(
                config.timeouts.request,
                Arc::clone(&state.clock),
                Arc::clone(&state.metrics),
            )),
    )
}

/// Partner-facing OCPI router.
pub fn build_ocpi_router(state: AppState, config: &GatewayConfig) -> Router {
    let version = &config.platform.version;
    let router = Router::new()
        .route("/health", get(health::health))
        .route(
            "/ocpi/versions",
            get(versions::get_versions).fallback(method_not_allowed),
        )
        .route(
            &format!("/ocpi/{version}"),
            get(versions::get_version_details).fallback(method_not_allowed),
        )
        .route(
            &format!("/ocpi/{version}/credentials"),
            get(credentials::get_credentials)
                .post(credentials::post_credentials)
                .put(credentials::put_credentials)
                .delete(credentials::delete_credentials)
                .fallback(method_not_allowed),
        )
        .fallback(fallback)
        .with_state(state.clone());

    with_common_layers(router, &state, config)
}

/// Operator router, guarded by the admin API key.
pub fn build_admin_router(state: AppState, config: &GatewayConfig) -> Router {
    let router = Router::new()
        .route(
            "/admin/token-a",
            post(admin::issue_token_a).fallback(method_not_allowed),
        )
        .route(
            "/admin/partners",
            get(admin::get_partner)
                .post(admin::register_partner)
                .put(admin::update_partner)
                .delete(admin::unregister_partner)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/partners/credentials",
            get(admin::get_partner_credentials).fallback(method_not_allowed),
        )
        .route("/admin/stats", get(admin::stats).fallback(method_not_allowed));

    #[cfg(feature = "metrics")]
    let router = router.route("/admin/metrics", get(admin::prometheus_metrics));

    let router = router
        .fallback(fallback)
        .layer(AdminAuthLayer::new(
            config.admin.api_key.clone(),
            Arc::clone(&state.clock),
        ))
        .route("/health", get(health::health))
        .with_state(state.clone());

    with_common_layers(router, &state, config)
}
