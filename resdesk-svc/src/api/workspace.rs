//! Workspace persistence and bibliography API handlers
//!
//! GET /workspace, POST /workspace, GET /bibliography

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::services::PipelineSession;
use crate::AppState;
use resdesk_common::model::{SessionState, Workspace};

/// POST /workspace response
#[derive(Debug, Serialize)]
pub struct LoadWorkspaceResponse {
    pub article_count: usize,
    pub state: SessionState,
}

/// GET /bibliography response
#[derive(Debug, Serialize)]
pub struct BibliographyResponse {
    pub entries: Vec<String>,
}

/// GET /workspace
///
/// Snapshot the entire session as a portable JSON document.
pub async fn export_workspace(State(state): State<AppState>) -> Json<Workspace> {
    let library = state.library.read().await;
    Json(library.to_workspace())
}

/// POST /workspace
///
/// Replace the current session with a previously exported workspace.
/// The articles key is mandatory; everything else defaults. A loaded
/// workspace lands directly in the READY state.
pub async fn load_workspace(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<LoadWorkspaceResponse>> {
    {
        let session = state.session.read().await;
        if session.is_processing() {
            return Err(ApiError::Conflict(
                "Cannot load a workspace while a classification run is in progress".to_string(),
            ));
        }
    }

    let workspace: Workspace = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid workspace file: {}", e)))?;
    let article_count = workspace.articles.len();

    {
        let mut library = state.library.write().await;
        library.load_workspace(workspace);
    }
    let mut session = state.session.write().await;
    *session = PipelineSession::new();
    session.transition_to(SessionState::Ready);
    session.update_progress(article_count, article_count, "Workspace loaded".to_string());

    tracing::info!(article_count, "Workspace loaded");
    Ok(Json(LoadWorkspaceResponse {
        article_count,
        state: session.state,
    }))
}

/// GET /bibliography
///
/// Citation list for the whole library, sorted by author.
pub async fn bibliography(State(state): State<AppState>) -> Json<BibliographyResponse> {
    let library = state.library.read().await;
    Json(BibliographyResponse {
        entries: library.bibliography(),
    })
}

/// Build workspace routes
pub fn workspace_routes() -> Router<AppState> {
    Router::new()
        .route("/workspace", get(export_workspace))
        .route("/workspace", post(load_workspace))
        .route("/bibliography", get(bibliography))
}
