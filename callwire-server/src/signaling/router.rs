use crate::auth::{TokenVerifier, authenticate};
use crate::signaling::{SignalingService, missing_room_handler, ws_handler};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Builds the relay's HTTP surface:
///
/// - `GET /health`
/// - `GET /api/v1/webrtc/{room_id}` behind bearer-token authentication
pub fn signaling_router(service: SignalingService, verifier: Arc<dyn TokenVerifier>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let webrtc = Router::new()
        .route("/webrtc/{room_id}", get(ws_handler))
        .route("/webrtc/", get(missing_room_handler))
        .route_layer(middleware::from_fn_with_state(verifier, authenticate));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", webrtc)
        .layer(cors)
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "callwire",
        "rooms": service.registry().room_count(),
    }))
}
