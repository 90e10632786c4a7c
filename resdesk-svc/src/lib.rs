//! resdesk-svc library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod error;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use resdesk_common::config::Config;
use resdesk_common::events::EventBus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::{Analyst, ModelGateway, PipelineSession};
use crate::store::Library;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<Config>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Annotated library (articles, taxonomy, reports, chat)
    pub library: Arc<RwLock<Library>>,
    /// Current classification session
    pub session: Arc<RwLock<PipelineSession>>,
    /// LLM-backed analyst
    pub analyst: Arc<Analyst>,
    /// Guard against concurrent synthesis report generation
    pub synthesis_busy: Arc<AtomicBool>,
    /// Guard against concurrent comparative report generation
    pub comparative_busy: Arc<AtomicBool>,
    /// Guard against overlapping chat turns
    pub chat_busy: Arc<AtomicBool>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, event_bus: EventBus, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            config: Arc::new(config),
            event_bus,
            library: Arc::new(RwLock::new(Library::default())),
            session: Arc::new(RwLock::new(PipelineSession::new())),
            analyst: Arc::new(Analyst::new(gateway)),
            synthesis_busy: Arc::new(AtomicBool::new(false)),
            comparative_busy: Arc::new(AtomicBool::new(false)),
            chat_busy: Arc::new(AtomicBool::new(false)),
            startup_time: Utc::now(),
        }
    }
}

/// Releases a busy flag when dropped, including when the owning request
/// future is cancelled mid-await by a disconnecting client.
pub struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    /// Claim the flag; None if another request holds it.
    pub fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .merge(api::session_routes())
        .route("/events", get(api::event_stream))
        .merge(api::article_routes())
        .merge(api::taxonomy_routes())
        .merge(api::report_routes())
        .merge(api::chat_routes())
        .merge(api::workspace_routes())
        .merge(api::health_routes())
        // The frontend is served from a different origin during development
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
