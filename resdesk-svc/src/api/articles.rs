//! Article browsing and curation API handlers
//!
//! GET /articles, GET /articles/:id, PATCH /articles/:id,
//! POST /articles/:id/quotes, DELETE /articles/:id/quotes/:index

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store::ArticlePatch;
use crate::AppState;
use resdesk_common::model::Article;

/// GET /articles query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ArticleFilter {
    /// Exact tag membership
    pub tag: Option<String>,
    /// Case-insensitive substring match against the alignment label
    pub alignment: Option<String>,
}

/// GET /articles response
#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<Article>,
    pub total: usize,
}

/// POST /articles/:id/quotes request
#[derive(Debug, Deserialize)]
pub struct AddQuoteRequest {
    pub quote: String,
}

/// GET /articles
///
/// List articles, optionally filtered by tag and/or alignment. Both filters
/// intersect. Order is upload order.
pub async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> Json<ArticleListResponse> {
    let library = state.library.read().await;
    let articles = library.filter(filter.tag.as_deref(), filter.alignment.as_deref());
    let total = articles.len();
    Json(ArticleListResponse { articles, total })
}

/// GET /articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Article>> {
    let library = state.library.read().await;
    let article = library
        .article(id)
        .ok_or_else(|| ApiError::NotFound(format!("Article not found: {}", id)))?;
    Ok(Json(article.clone()))
}

/// PATCH /articles/:id
///
/// Partial update of the editable fields. Tags unknown to the taxonomy are
/// added to it; user edits are not capped at three tags.
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ArticlePatch>,
) -> ApiResult<Json<Article>> {
    let mut library = state.library.write().await;
    let article = library.update_article(id, req)?;
    Ok(Json(article))
}

/// POST /articles/:id/quotes
pub async fn add_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddQuoteRequest>,
) -> ApiResult<Json<Article>> {
    if req.quote.trim().is_empty() {
        return Err(ApiError::BadRequest("Quote must not be empty".to_string()));
    }
    let mut library = state.library.write().await;
    library.add_quote(id, req.quote)?;
    let article = library
        .article(id)
        .ok_or_else(|| ApiError::NotFound(format!("Article not found: {}", id)))?;
    Ok(Json(article.clone()))
}

/// DELETE /articles/:id/quotes/:index
pub async fn remove_quote(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<Article>> {
    let mut library = state.library.write().await;
    library.remove_quote(id, index)?;
    let article = library
        .article(id)
        .ok_or_else(|| ApiError::NotFound(format!("Article not found: {}", id)))?;
    Ok(Json(article.clone()))
}

/// Build article routes
pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/:id", get(get_article))
        .route("/articles/:id", patch(update_article))
        .route("/articles/:id/quotes", post(add_quote))
        .route("/articles/:id/quotes/:index", delete(remove_quote))
}
