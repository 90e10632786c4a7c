//! Classification pipeline: intake -> taxonomy -> per-document deep analysis
//!
//! # State Progression
//! SETUP -> PROCESSING -> READY
//!
//! Within PROCESSING the run is strictly sequential: one taxonomy call for
//! the whole batch, then one deep-analysis call per document in upload order,
//! with a fixed sleep between consecutive documents as a crude throttle
//! against external API rate limits. A failed document still produces a
//! placeholder article, so the article count always equals the file count.
//! There is no cancellation: once started, a run completes or degrades.

use crate::services::analyst::Analyst;
use crate::store::Library;
use chrono::{DateTime, Utc};
use resdesk_common::events::{EventBus, ResdeskEvent};
use resdesk_common::model::{Article, ChatMessage, RawDocument, SessionState, TaxonomyMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Progress tracking, observable while a run is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProgress {
    /// Documents completed so far
    pub current: usize,
    /// Total documents in this run
    pub total: usize,
    /// Human-readable description of the current operation
    pub status: String,
}

impl Default for SessionProgress {
    fn default() -> Self {
        Self {
            current: 0,
            total: 0,
            status: String::from("Waiting for files..."),
        }
    }
}

/// Classification session (in-memory state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSession {
    pub session_id: Uuid,
    pub state: SessionState,
    pub progress: SessionProgress,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: SessionState::Setup,
            progress: SessionProgress::default(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, returning the old one.
    pub fn transition_to(&mut self, new_state: SessionState) -> SessionState {
        let old_state = self.state;
        self.state = new_state;
        if new_state == SessionState::Ready {
            self.ended_at = Some(Utc::now());
        }
        old_state
    }

    pub fn update_progress(&mut self, current: usize, total: usize, status: String) {
        self.progress.current = current;
        self.progress.total = total;
        self.progress.status = status;
    }

    pub fn is_processing(&self) -> bool {
        self.state == SessionState::Processing
    }
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline orchestrator.
///
/// Owns no library state of its own; it mutates the shared store and session
/// handed to [`run`](Self::run) and broadcasts progress on the event bus.
pub struct ClassificationPipeline {
    analyst: Analyst,
    event_bus: EventBus,
    inter_document_delay: Duration,
}

impl ClassificationPipeline {
    pub fn new(analyst: Analyst, event_bus: EventBus, inter_document_delay: Duration) -> Self {
        Self {
            analyst,
            event_bus,
            inter_document_delay,
        }
    }

    /// Execute one classification run over `documents`, in order.
    ///
    /// The caller has already transitioned the session to PROCESSING and
    /// recorded the user guide and taxonomy mode in the store; this method
    /// performs the network-bound phases and the final transition to READY.
    pub async fn run(
        &self,
        documents: Vec<RawDocument>,
        user_guide: String,
        mode: TaxonomyMode,
        library: Arc<RwLock<Library>>,
        session: Arc<RwLock<PipelineSession>>,
    ) {
        let start_time = std::time::Instant::now();
        let total = documents.len();
        let session_id = session.read().await.session_id;

        tracing::info!(
            session_id = %session_id,
            total_files = total,
            ?mode,
            "Starting classification run"
        );
        self.event_bus.emit_lossy(ResdeskEvent::SessionStarted {
            session_id,
            total_files: total,
            timestamp: Utc::now(),
        });

        // Phase 1: corpus taxonomy, fixed input to every analysis in this run
        session
            .write()
            .await
            .update_progress(0, total, "Generating Taxonomy...".to_string());

        let titles: Vec<String> = documents.iter().map(|d| d.title.clone()).collect();
        let taxonomy = self
            .analyst
            .generate_taxonomy(&titles, &user_guide, mode)
            .await;

        {
            let mut library = library.write().await;
            library.taxonomy = taxonomy.tags.clone();
        }
        self.event_bus.emit_lossy(ResdeskEvent::TaxonomyGenerated {
            session_id,
            tags: taxonomy.tags.clone(),
            degraded: taxonomy.degraded,
            timestamp: Utc::now(),
        });

        // Phase 2: per-document deep analysis, strictly in upload order
        for (index, document) in documents.into_iter().enumerate() {
            let current = index + 1;
            session.write().await.update_progress(
                current,
                total,
                format!("Deep Analysis: {}...", document.title),
            );

            let analysis = self
                .analyst
                .analyze_document(&document.full_text, &user_guide, &taxonomy.tags)
                .await;
            let degraded = analysis.degraded;

            let article = Article {
                id: document.id,
                excerpt: Article::excerpt_of(&document.full_text),
                title: document.title.clone(),
                full_text: document.full_text,
                real_title: analysis.real_title,
                year: analysis.year,
                authors: analysis.authors,
                full_abstract: analysis.full_abstract,
                main_points: analysis.main_points,
                conclusions: analysis.conclusions,
                tags: analysis.selected_tags,
                alignment: analysis.alignment,
                quotes: analysis.quotes,
                abnt_draft: analysis.abnt_draft,
                degraded,
            };
            library.write().await.add_article(article);

            if degraded {
                tracing::warn!(
                    session_id = %session_id,
                    title = %document.title,
                    "Document analysis degraded to placeholder"
                );
            }
            self.event_bus.emit_lossy(ResdeskEvent::DocumentAnalyzed {
                session_id,
                current,
                total,
                title: document.title,
                degraded,
                timestamp: Utc::now(),
            });

            // Fixed throttle between consecutive documents; not adaptive
            if current < total && !self.inter_document_delay.is_zero() {
                tokio::time::sleep(self.inter_document_delay).await;
            }
        }

        // Phase 3: READY — seed the chat with its introductory message
        {
            let mut library = library.write().await;
            library.chat_messages = vec![ChatMessage::ai(format!(
                "I have analyzed {} papers using their full text. \
                 Ask me anything about them, and I'll cite my sources.",
                total
            ))];
        }
        let old_state = {
            let mut session = session.write().await;
            session.update_progress(total, total, "Analysis complete".to_string());
            session.transition_to(SessionState::Ready)
        };
        self.event_bus.emit_lossy(ResdeskEvent::SessionStateChanged {
            session_id,
            old_state,
            new_state: SessionState::Ready,
            timestamp: Utc::now(),
        });

        let duration_seconds = start_time.elapsed().as_secs();
        tracing::info!(
            session_id = %session_id,
            article_count = total,
            duration_seconds,
            "Classification run completed"
        );
        self.event_bus.emit_lossy(ResdeskEvent::SessionCompleted {
            session_id,
            article_count: total,
            duration_seconds,
            timestamp: Utc::now(),
        });
    }
}
