//! Data transfer objects for HTTP message serialization.

use serde::{Deserialize, Serialize};
use swarmone_core::RequestMeta;

/// Body of `POST /v1/ask`.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Accepted for client compatibility; not used when answering.
    #[serde(default)]
    #[allow(dead_code)]
    pub template_id: Option<String>,
    pub instruction: String,
}

/// Successful answer with its scoring metadata, as one flat object.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(flatten)]
    pub meta: RequestMeta,
}

/// Failed request: error message plus the same metadata fields.
#[derive(Debug, Serialize)]
pub struct AskFailure {
    pub detail: String,
    #[serde(flatten)]
    pub meta: RequestMeta,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub runners: usize,
}
