//! Route handler functions for all API endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lumen_nlq::{AnalysisResult, SessionContext};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Analysis
// =============================================================================

/// Request body for POST /api/analyze.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub question: String,
    /// A new session id is generated when absent or blank.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/analyze - answer one question within a session.
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let session_id = req
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let result = state
        .orchestrator
        .process_question(&req.question, &session_id)
        .await?;
    Ok(Json(result))
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub context: SessionContext,
}

/// GET /api/sessions - known session ids.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.orchestrator.contexts().sessions(),
    })
}

/// GET /api/sessions/{id} - remembered context for one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let context = state
        .orchestrator
        .contexts()
        .snapshot(&id)
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {}", id)))?;
    Ok(Json(SessionResponse {
        session_id: id,
        context,
    }))
}

/// DELETE /api/sessions/{id} - forget a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.orchestrator.contexts().remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Session not found: {}", id)))
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.orchestrator.contexts().sessions().len(),
    })
}
