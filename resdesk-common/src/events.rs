//! Event types for the ResDesk event system
//!
//! Provides the event definitions and EventBus used to broadcast pipeline
//! progress to SSE subscribers and any other observer.

use crate::model::SessionState;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// ResDesk event types
///
/// Events are broadcast via [`EventBus`] and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResdeskEvent {
    /// Classification run started
    SessionStarted {
        session_id: Uuid,
        /// Number of uploaded files in this run
        total_files: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Corpus-wide taxonomy generated (fixed for the rest of the run)
    TaxonomyGenerated {
        session_id: Uuid,
        tags: Vec<String>,
        /// True when the taxonomy is the fallback list because the call failed
        degraded: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One document finished deep analysis
    DocumentAnalyzed {
        session_id: Uuid,
        /// 1-based index of the document just completed
        current: usize,
        total: usize,
        title: String,
        /// True when the article holds fallback placeholder content
        degraded: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session state changed (setup -> processing -> ready)
    SessionStateChanged {
        session_id: Uuid,
        old_state: SessionState,
        new_state: SessionState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Classification run completed; library is ready
    SessionCompleted {
        session_id: Uuid,
        article_count: usize,
        duration_seconds: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ResdeskEvent {
    /// Get event type as string for SSE event naming
    pub fn event_type(&self) -> &str {
        match self {
            ResdeskEvent::SessionStarted { .. } => "SessionStarted",
            ResdeskEvent::TaxonomyGenerated { .. } => "TaxonomyGenerated",
            ResdeskEvent::DocumentAnalyzed { .. } => "DocumentAnalyzed",
            ResdeskEvent::SessionStateChanged { .. } => "SessionStateChanged",
            ResdeskEvent::SessionCompleted { .. } => "SessionCompleted",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally: non-blocking publish, multiple
/// concurrent subscribers, automatic cleanup when subscribers drop.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ResdeskEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ResdeskEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)` when at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ResdeskEvent,
    ) -> Result<usize, broadcast::error::SendError<ResdeskEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening.
    pub fn emit_lossy(&self, event: ResdeskEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
