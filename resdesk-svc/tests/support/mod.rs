//! Shared helpers for integration tests

// Not every test target uses every helper
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use resdesk_common::config::Config;
use resdesk_common::events::EventBus;
use resdesk_common::model::{Article, SessionState};
use resdesk_svc::services::gemini::{GatewayError, ModelGateway};
use resdesk_svc::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Gateway that plays back a scripted sequence of replies and records every
/// prompt it was given.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::Network("scripted failure".to_string())));
    }

    /// A well-formed taxonomy reply.
    pub fn push_taxonomy(&self, tags: &[&str]) {
        self.push_ok(json!({ "tags": tags }).to_string());
    }

    /// A well-formed deep-analysis reply with the given tags and alignment.
    pub fn push_analysis(&self, title: &str, tags: &[&str], alignment: &str) {
        self.push_ok(
            json!({
                "selectedTags": tags,
                "alignment": alignment,
                "realTitle": title,
                "year": "2021",
                "authors": "DOE, J.",
                "fullAbstract": format!("Abstract of {}", title),
                "mainPoints": "Main points.",
                "conclusions": "Conclusions.",
                "quotes": ["First quote.", "Second quote."],
                "abntDraft": format!("DOE, J. {}. 2021.", title),
            })
            .to_string(),
        );
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate(&self, prompt: &str, _json_mode: bool) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Network("script exhausted".to_string())))
    }
}

/// Gateway whose first `hang_calls` calls never resolve; later calls answer.
/// Stands in for a model request still in flight when the caller goes away.
pub struct HangingGateway {
    hang_calls: usize,
    calls: AtomicUsize,
}

impl HangingGateway {
    pub fn new(hang_calls: usize) -> Self {
        Self {
            hang_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ModelGateway for HangingGateway {
    async fn generate(&self, _prompt: &str, _json_mode: bool) -> Result<String, GatewayError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.hang_calls {
            std::future::pending::<()>().await;
        }
        Ok("answer".to_string())
    }
}

/// An already-analyzed article, for seeding the library without running a
/// classification pass.
pub fn seeded_article(title: &str) -> Article {
    let full_text = format!("Full text of {}", title);
    Article {
        id: Uuid::new_v4(),
        title: title.to_string(),
        excerpt: Article::excerpt_of(&full_text),
        full_text,
        real_title: title.to_string(),
        year: "2021".to_string(),
        authors: "DOE, J.".to_string(),
        full_abstract: String::new(),
        main_points: String::new(),
        conclusions: String::new(),
        tags: vec!["Unsorted".to_string()],
        alignment: "Neutral".to_string(),
        quotes: Vec::new(),
        abnt_draft: String::new(),
        degraded: false,
    }
}

/// Test config: no inter-document delay.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.inter_document_delay_ms = 0;
    config
}

/// App state backed by the given gateway.
pub fn setup_state(gateway: Arc<dyn ModelGateway>) -> AppState {
    AppState::new(test_config(), EventBus::new(100), gateway)
}

/// Router plus a state handle for inspecting shared storage.
pub fn setup_app(gateway: Arc<dyn ModelGateway>) -> (axum::Router, AppState) {
    let state = setup_state(gateway);
    (build_router(state.clone()), state)
}

/// Build a JSON request.
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a bodyless request.
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Extract JSON body from a response body.
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Wait for the background pipeline to reach READY.
pub async fn wait_until_ready(state: &AppState) {
    for _ in 0..200 {
        if state.session.read().await.state == SessionState::Ready {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Classification run did not reach READY in time");
}

/// A standard two-document start request.
pub fn start_request_body() -> Value {
    json!({
        "userGuide": "Grazing pressure drives grassland degradation",
        "taxonomyMode": "standard",
        "files": [
            { "title": "paper_a.txt", "text": "Full text of paper A about grazing." },
            { "title": "paper_b.txt", "text": "Full text of paper B about soils." },
        ],
    })
}
