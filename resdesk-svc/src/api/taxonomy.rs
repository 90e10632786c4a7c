//! Taxonomy management API handlers
//!
//! GET /taxonomy, POST /taxonomy, DELETE /taxonomy/:tag

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /taxonomy response
#[derive(Debug, Serialize)]
pub struct TaxonomyResponse {
    pub tags: Vec<String>,
}

/// POST /taxonomy request
#[derive(Debug, Deserialize)]
pub struct AddTagRequest {
    pub tag: String,
}

/// GET /taxonomy
pub async fn get_taxonomy(State(state): State<AppState>) -> Json<TaxonomyResponse> {
    let library = state.library.read().await;
    Json(TaxonomyResponse {
        tags: library.taxonomy.clone(),
    })
}

/// POST /taxonomy
///
/// Add a tag to the taxonomy. Duplicates and empty tags are rejected.
pub async fn add_tag(
    State(state): State<AppState>,
    Json(req): Json<AddTagRequest>,
) -> ApiResult<Json<TaxonomyResponse>> {
    let tag = req.tag.trim().to_string();
    let mut library = state.library.write().await;
    if !library.add_tag(&tag) {
        return Err(ApiError::BadRequest(format!(
            "Tag is empty or already exists: {:?}",
            tag
        )));
    }
    Ok(Json(TaxonomyResponse {
        tags: library.taxonomy.clone(),
    }))
}

/// DELETE /taxonomy/:tag
///
/// Remove a tag from the taxonomy and strip it from every article that
/// carries it. An article may be left with zero tags.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<Json<TaxonomyResponse>> {
    let mut library = state.library.write().await;
    if !library.delete_tag(&tag) {
        return Err(ApiError::NotFound(format!("Tag not found: {:?}", tag)));
    }
    tracing::info!(tag = %tag, "Tag deleted and cascaded off articles");
    Ok(Json(TaxonomyResponse {
        tags: library.taxonomy.clone(),
    }))
}

/// Build taxonomy routes
pub fn taxonomy_routes() -> Router<AppState> {
    Router::new()
        .route("/taxonomy", get(get_taxonomy))
        .route("/taxonomy", post(add_tag))
        .route("/taxonomy/:tag", delete(delete_tag))
}
