use crate::router::AppState;
use axum::{extract::State, Json};
use ocpi_types::envelope::timestamp;
use serde_json::{json, Value};

/// Liveness check. Not enveloped and not authenticated.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": state.platform.version,
        "timestamp": timestamp::format(&state.clock.now()),
    }))
}
