//! Report generation API handlers
//!
//! POST /reports/synthesis, POST /reports/comparative, GET /reports

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, BusyGuard};

/// POST /reports/synthesis request
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisRequest {
    /// Restrict the synthesis to articles carrying this tag
    pub tag: Option<String>,
}

/// Report response (both report kinds)
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: String,
}

/// GET /reports response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsResponse {
    pub synth_report: Option<String>,
    pub comp_report: Option<String>,
}

/// POST /reports/synthesis
///
/// Generate the gap-analysis synthesis over the library (or the tag subset)
/// and store it. One synthesis at a time; concurrent requests get 409.
pub async fn synthesis_report(
    State(state): State<AppState>,
    Json(req): Json<SynthesisRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let _guard = BusyGuard::claim(&state.synthesis_busy).ok_or_else(|| {
        ApiError::Conflict("Synthesis report generation already in progress".to_string())
    })?;

    let articles = {
        let library = state.library.read().await;
        if library.articles.is_empty() {
            return Err(ApiError::BadRequest(
                "No articles to synthesize".to_string(),
            ));
        }
        library.articles.clone()
    };

    let report = state
        .analyst
        .synthesis_report(&articles, req.tag.as_deref())
        .await;
    state.library.write().await.synth_report = Some(report.clone());

    tracing::info!(tag = ?req.tag, "Synthesis report generated");
    Ok(Json(ReportResponse { report }))
}

/// POST /reports/comparative
///
/// Generate the thesis-validation comparative analysis over the whole
/// library and store it. One at a time; concurrent requests get 409.
pub async fn comparative_report(State(state): State<AppState>) -> ApiResult<Json<ReportResponse>> {
    let _guard = BusyGuard::claim(&state.comparative_busy).ok_or_else(|| {
        ApiError::Conflict("Comparative report generation already in progress".to_string())
    })?;

    let (user_guide, articles) = {
        let library = state.library.read().await;
        if library.articles.is_empty() {
            return Err(ApiError::BadRequest("No articles to compare".to_string()));
        }
        (library.user_guide.clone(), library.articles.clone())
    };

    let report = state.analyst.comparative_report(&user_guide, &articles).await;
    state.library.write().await.comp_report = Some(report.clone());

    tracing::info!("Comparative report generated");
    Ok(Json(ReportResponse { report }))
}

/// GET /reports
///
/// Return the stored reports, if any have been generated this session.
pub async fn get_reports(State(state): State<AppState>) -> Json<ReportsResponse> {
    let library = state.library.read().await;
    Json(ReportsResponse {
        synth_report: library.synth_report.clone(),
        comp_report: library.comp_report.clone(),
    })
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/synthesis", post(synthesis_report))
        .route("/reports/comparative", post(comparative_report))
        .route("/reports", get(get_reports))
}
