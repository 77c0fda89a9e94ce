use super::handlers::rpc::handle_rpc;
use super::middleware::logging::logging_middleware;
use super::middleware::rate_limit::{stream_rate_limit, unary_rate_limit};
use super::middleware::recovery::recovery_middleware;
use super::state::ApiState;
use super::streams::{ws_audit, ws_key_events, ws_sign};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::sync::Arc;

pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/rpc", post(handle_rpc).route_layer(axum::middleware::from_fn_with_state(state.clone(), unary_rate_limit)))
        .route(
            "/ws/key-events",
            get(ws_key_events).route_layer(axum::middleware::from_fn_with_state(state.clone(), stream_rate_limit)),
        )
        .route("/ws/audit", get(ws_audit).route_layer(axum::middleware::from_fn_with_state(state.clone(), stream_rate_limit)))
        .route("/ws/sign", get(ws_sign).route_layer(axum::middleware::from_fn_with_state(state.clone(), stream_rate_limit)))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn(recovery_middleware))
        .with_state(state)
}

async fn handle_health() -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "status": "ok" }))
}
