//! Classification session API handlers
//!
//! POST /session/start, GET /session/status

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::{ClassificationPipeline, PipelineSession};
use crate::store::Library;
use crate::AppState;
use resdesk_common::model::{RawDocument, SessionState, TaxonomyMode};

/// One uploaded document
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub title: String,
    pub text: String,
}

/// POST /session/start request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub user_guide: String,
    #[serde(default)]
    pub taxonomy_mode: TaxonomyMode,
    pub files: Vec<UploadedFile>,
}

/// POST /session/start response
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub state: SessionState,
    pub total_files: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// GET /session/status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub state: SessionState,
    pub progress: crate::services::pipeline::SessionProgress,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// POST /session/start
///
/// Begin a classification run over the uploaded documents. Returns 202-style
/// immediately; progress is observable via GET /session/status and /events.
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> ApiResult<Json<StartSessionResponse>> {
    if request.files.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one file is required".to_string(),
        ));
    }
    if request.user_guide.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "A research guide (thesis) is required".to_string(),
        ));
    }
    if request.files.iter().any(|f| f.title.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Every file needs a non-empty title".to_string(),
        ));
    }

    let documents: Vec<RawDocument> = request
        .files
        .into_iter()
        .map(|f| RawDocument::new(f.title, f.text))
        .collect();
    let total_files = documents.len();

    // Fresh session and fresh library for this run
    let mut new_session = PipelineSession::new();
    new_session.transition_to(SessionState::Processing);
    new_session.update_progress(0, total_files, "Initializing Systems...".to_string());
    let response = StartSessionResponse {
        session_id: new_session.session_id,
        state: new_session.state,
        total_files,
        started_at: new_session.started_at,
    };
    // Only one run at a time (409 Conflict). Check-and-replace under a
    // single write lock so concurrent starts cannot both pass the check.
    {
        let mut session = state.session.write().await;
        if session.is_processing() {
            return Err(ApiError::Conflict(
                "A classification run is already in progress".to_string(),
            ));
        }
        *session = new_session;
    }
    {
        let mut library = state.library.write().await;
        *library = Library::default();
        library.user_guide = request.user_guide.clone();
        library.taxonomy_mode = request.taxonomy_mode;
    }

    tracing::info!(
        session_id = %response.session_id,
        total_files,
        "Classification session started"
    );

    // Background task runs the pipeline to completion
    let pipeline = ClassificationPipeline::new(
        (*state.analyst).clone(),
        state.event_bus.clone(),
        Duration::from_millis(state.config.pipeline.inter_document_delay_ms),
    );
    let library = state.library.clone();
    let session = state.session.clone();
    let user_guide = request.user_guide;
    let taxonomy_mode = request.taxonomy_mode;
    tokio::spawn(async move {
        pipeline
            .run(documents, user_guide, taxonomy_mode, library, session)
            .await;
    });

    Ok(Json(response))
}

/// GET /session/status
///
/// Poll classification progress.
pub async fn session_status(State(state): State<AppState>) -> Json<SessionStatusResponse> {
    let session = state.session.read().await;
    Json(SessionStatusResponse {
        session_id: session.session_id,
        state: session.state,
        progress: session.progress.clone(),
        started_at: session.started_at,
        ended_at: session.ended_at,
    })
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/status", get(session_status))
}
