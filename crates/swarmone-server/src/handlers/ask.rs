//! Ensemble answer handler.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use swarmone_engine::{execute, ExecutionScope};
use tracing::{error, info};

use crate::dto::{AskRequest, AskResponse};
use crate::error::AppError;
use crate::ServerState;

/// Answers one instruction with the judge-selected runner answer.
///
/// The request runs under the configured overall timeout; if the client
/// disconnects, the dropped future cancels every in-flight provider call.
pub async fn ask(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(req) = payload?;
    if req.instruction.trim().is_empty() {
        return Err(AppError::BadRequest("instruction is required".into()));
    }

    info!("Ask: {}...", req.instruction.chars().take(50).collect::<String>());

    let scope = ExecutionScope::with_timeout(state.config.server.request_timeout);
    match execute(&scope, &state.config, state.factory.as_ref(), &req.instruction).await {
        Ok(consensus) => Ok(Json(AskResponse {
            answer: consensus.answer,
            meta: consensus.meta,
        })),
        Err(e) => {
            error!("Ask failed ({}): {}", e.meta.consensus_id, e);
            Err(e.into())
        }
    }
}
