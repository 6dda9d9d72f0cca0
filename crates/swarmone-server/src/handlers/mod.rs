//! HTTP route handlers.

pub mod ask;

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::ServerState;

/// Health check endpoint.
pub async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        runners: state.config.runners.len(),
    })
}
