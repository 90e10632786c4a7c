//! Integration tests for the resdesk-svc API surface
//!
//! Tests cover:
//! - Health endpoint
//! - Session start validation and conflict handling
//! - Full classification run (taxonomy + per-document analysis)
//! - Degraded fallback behavior when model calls fail
//! - Article filtering, patching, and quote curation
//! - Taxonomy management with cascade delete
//! - Report generation and retrieval
//! - Corpus chat
//! - Workspace export/load round-trip and bibliography

mod support;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::*;
use tower::util::ServiceExt; // for `oneshot` method

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = setup_app(Arc::new(ScriptedGateway::new()));

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "resdesk-svc");
    assert!(body["version"].is_string());
}

// =============================================================================
// Session start validation
// =============================================================================

#[tokio::test]
async fn test_start_rejects_empty_file_list() {
    let (app, _state) = setup_app(Arc::new(ScriptedGateway::new()));

    let body = json!({ "userGuide": "A thesis", "files": [] });
    let response = app
        .oneshot(json_request("POST", "/session/start", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_start_rejects_blank_guide() {
    let (app, _state) = setup_app(Arc::new(ScriptedGateway::new()));

    let body = json!({
        "userGuide": "   ",
        "files": [{ "title": "a.txt", "text": "text" }],
    });
    let response = app
        .oneshot(json_request("POST", "/session/start", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_conflicts_while_processing() {
    let (app, state) = setup_app(Arc::new(ScriptedGateway::new()));

    state
        .session
        .write()
        .await
        .transition_to(resdesk_common::model::SessionState::Processing);

    let response = app
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_simultaneous_starts_admit_exactly_one() {
    // Every model call hangs, so the first accepted run stays in
    // Processing while the race plays out.
    let (app, _state) = setup_app(Arc::new(HangingGateway::new(usize::MAX)));

    let (first, second) = tokio::join!(
        app.clone()
            .oneshot(json_request("POST", "/session/start", start_request_body())),
        app.clone()
            .oneshot(json_request("POST", "/session/start", start_request_body())),
    );

    let mut statuses = [first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
}

// =============================================================================
// Full classification run
// =============================================================================

#[tokio::test]
async fn test_full_run_populates_library() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_taxonomy(&["Grazing", "Soils", "Unsorted"]);
    gateway.push_analysis("Paper A", &["Grazing", "Soils"], "Supports Thesis");
    gateway.push_analysis("Paper B", &["Soils"], "Contradicts Thesis");
    let (app, state) = setup_app(gateway.clone());

    let response = app
        .clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["state"], "processing");
    assert_eq!(body["total_files"], 2);

    wait_until_ready(&state).await;

    // Status reflects completion
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/session/status"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["state"], "ready");
    assert_eq!(body["progress"]["current"], 2);
    assert_eq!(body["progress"]["total"], 2);

    // One article per uploaded file, in upload order
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/articles"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles[0]["title"], "paper_a.txt");
    assert_eq!(articles[0]["realTitle"], "Paper A");
    assert_eq!(articles[0]["tags"], json!(["Grazing", "Soils"]));
    assert_eq!(articles[0]["alignment"], "Supports Thesis");
    assert_eq!(articles[0]["degraded"], false);
    assert_eq!(articles[1]["title"], "paper_b.txt");

    // Excerpt is derived locally with the trailing ellipsis
    let excerpt = articles[0]["abstract"].as_str().unwrap();
    assert!(excerpt.ends_with("..."));

    // Taxonomy comes from the model reply
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/taxonomy"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["tags"], json!(["Grazing", "Soils", "Unsorted"]));

    // Chat is seeded with the introduction
    let response = app
        .oneshot(empty_request("GET", "/chat"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "ai");
    assert!(messages[0]["text"]
        .as_str()
        .unwrap()
        .contains("analyzed 2 papers"));

    // One taxonomy call plus one analysis call per document
    assert_eq!(gateway.prompts().len(), 3);
}

#[tokio::test]
async fn test_failed_analysis_degrades_to_placeholder() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_taxonomy(&["Grazing", "Soils", "Unsorted"]);
    gateway.push_err();
    gateway.push_analysis("Paper B", &["Soils"], "Neutral");
    let (app, state) = setup_app(gateway);

    app.clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    wait_until_ready(&state).await;

    let response = app.oneshot(empty_request("GET", "/articles")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);

    let placeholder = &body["articles"][0];
    assert_eq!(placeholder["tags"], json!(["Unsorted"]));
    assert_eq!(placeholder["alignment"], "Neutral");
    assert_eq!(placeholder["realTitle"], "Unknown Title");
    assert_eq!(placeholder["year"], "Unknown");
    assert_eq!(placeholder["quotes"], json!([]));
    assert_eq!(placeholder["degraded"], true);

    assert_eq!(body["articles"][1]["degraded"], false);
}

#[tokio::test]
async fn test_failed_taxonomy_uses_fallback_list() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_err();
    gateway.push_analysis("Paper A", &["Management"], "Neutral");
    gateway.push_analysis("Paper B", &["Unsorted"], "Neutral");
    let (app, state) = setup_app(gateway);

    app.clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    wait_until_ready(&state).await;

    let response = app.oneshot(empty_request("GET", "/taxonomy")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["tags"],
        json!(["General Ecology", "Management", "Unsorted"])
    );
}

// =============================================================================
// Article filtering and curation
// =============================================================================

async fn ready_app() -> (axum::Router, resdesk_svc::AppState) {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_taxonomy(&["Grazing", "Soils", "Unsorted"]);
    gateway.push_analysis("Paper A", &["Grazing", "Soils"], "Supports Thesis");
    gateway.push_analysis("Paper B", &["Soils"], "Contradicts Thesis");
    let (app, state) = setup_app(gateway);

    app.clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    wait_until_ready(&state).await;
    (app, state)
}

#[tokio::test]
async fn test_article_filters_intersect() {
    let (app, _state) = ready_app().await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/articles?tag=Grazing"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["articles"][0]["title"], "paper_a.txt");

    // Alignment matching is case-insensitive substring containment
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/articles?alignment=contradicts"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["articles"][0]["title"], "paper_b.txt");

    let response = app
        .oneshot(empty_request("GET", "/articles?tag=Soils&alignment=supports"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["articles"][0]["title"], "paper_a.txt");
}

#[tokio::test]
async fn test_patch_article_extends_taxonomy() {
    let (app, _state) = ready_app().await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/articles"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let id = body["articles"][0]["id"].as_str().unwrap().to_string();

    // Four tags including one the taxonomy has never seen
    let patch = json!({
        "tags": ["Grazing", "Soils", "Unsorted", "Hydrology"],
        "alignment": "Neutral",
    });
    let response = app
        .clone()
        .oneshot(json_request("PATCH", &format!("/articles/{}", id), patch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["tags"].as_array().unwrap().len(), 4);
    assert_eq!(body["alignment"], "Neutral");

    let response = app
        .oneshot(empty_request("GET", "/taxonomy"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert!(body["tags"].as_array().unwrap().contains(&json!("Hydrology")));
}

#[tokio::test]
async fn test_patch_unknown_article_is_404() {
    let (app, _state) = ready_app().await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/articles/{}", uuid::Uuid::new_v4()),
            json!({ "alignment": "Neutral" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quote_add_and_remove() {
    let (app, _state) = ready_app().await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/articles"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let id = body["articles"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/articles/{}/quotes", id),
            json!({ "quote": "A third quote." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["quotes"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/articles/{}/quotes/0", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["quotes"].as_array().unwrap().len(), 2);
    assert_eq!(body["quotes"][0], "Second quote.");

    // Out-of-range index
    let response = app
        .oneshot(empty_request("DELETE", &format!("/articles/{}/quotes/99", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Taxonomy management
// =============================================================================

#[tokio::test]
async fn test_taxonomy_add_rejects_duplicates() {
    let (app, _state) = ready_app().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/taxonomy", json!({ "tag": "Hydrology" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/taxonomy", json!({ "tag": "Hydrology" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_taxonomy_delete_cascades_to_articles() {
    let (app, _state) = ready_app().await;

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/taxonomy/Soils"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(!body["tags"].as_array().unwrap().contains(&json!("Soils")));

    // Stripped from every article; paper B may be left with zero tags
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/articles"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["articles"][0]["tags"], json!(["Grazing"]));
    assert_eq!(body["articles"][1]["tags"], json!([]));

    let response = app
        .oneshot(empty_request("DELETE", "/taxonomy/Nonexistent"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_reports_are_generated_and_stored() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_taxonomy(&["Grazing", "Soils", "Unsorted"]);
    gateway.push_analysis("Paper A", &["Grazing"], "Supports Thesis");
    gateway.push_analysis("Paper B", &["Soils"], "Neutral");
    let (app, state) = setup_app(gateway.clone());

    app.clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    wait_until_ready(&state).await;

    gateway.push_ok("## Synthesis\nGaps identified.");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/reports/synthesis", json!({ "tag": "Grazing" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["report"], "## Synthesis\nGaps identified.");

    gateway.push_ok("## Verdict\nThesis partially supported.");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/reports/comparative", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(empty_request("GET", "/reports")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["synthReport"], "## Synthesis\nGaps identified.");
    assert_eq!(body["compReport"], "## Verdict\nThesis partially supported.");
}

#[tokio::test]
async fn test_failed_report_returns_fallback_text() {
    let (app, _state) = ready_app().await;

    // Gateway script is exhausted, so the report call fails
    let response = app
        .oneshot(json_request("POST", "/reports/synthesis", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["report"], "Failed to generate synthesis.");
}

#[tokio::test]
async fn test_reports_require_articles() {
    let (app, _state) = setup_app(Arc::new(ScriptedGateway::new()));

    let response = app
        .oneshot(json_request("POST", "/reports/synthesis", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_turn_appends_history() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_taxonomy(&["Grazing", "Soils", "Unsorted"]);
    gateway.push_analysis("Paper A", &["Grazing"], "Neutral");
    gateway.push_analysis("Paper B", &["Soils"], "Neutral");
    let (app, state) = setup_app(gateway.clone());

    app.clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    wait_until_ready(&state).await;

    gateway.push_ok("Paper A (Paper A) addresses that directly.");
    let response = app
        .clone()
        .oneshot(json_request("POST", "/chat", json!({ "text": "Which paper covers grazing?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reply"]["role"], "ai");

    // Seed + user turn + reply
    let response = app.oneshot(empty_request("GET", "/chat")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[2]["role"], "ai");

    // The chat prompt carried the full text of the documents
    let prompts = gateway.prompts();
    let chat_prompt = prompts.last().unwrap();
    assert!(chat_prompt.contains("Full text of paper A"));
    assert!(chat_prompt.contains("Which paper covers grazing?"));
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let (app, _state) = ready_app().await;

    let response = app
        .oneshot(json_request("POST", "/chat", json!({ "text": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_busy_clears_when_request_is_dropped() {
    // First model call hangs forever; the second answers normally.
    let (app, state) = setup_app(Arc::new(HangingGateway::new(1)));
    state
        .library
        .write()
        .await
        .add_article(seeded_article("paper_a.txt"));

    // Abandon a turn mid-call, as a disconnecting client would.
    let hung = app
        .clone()
        .oneshot(json_request("POST", "/chat", json!({ "text": "first" })));
    assert!(tokio::time::timeout(Duration::from_millis(50), hung)
        .await
        .is_err());

    // The next turn must be admitted, not 409.
    let response = app
        .clone()
        .oneshot(json_request("POST", "/chat", json!({ "text": "second" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The abandoned turn left no trace in the transcript.
    let response = app.oneshot(empty_request("GET", "/chat")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["text"], "second");
    assert_eq!(messages[1]["role"], "ai");
}

// =============================================================================
// Workspace and bibliography
// =============================================================================

#[tokio::test]
async fn test_workspace_round_trip() {
    let (app, _state) = ready_app().await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/workspace"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = extract_json(response.into_body()).await;
    assert_eq!(snapshot["articles"].as_array().unwrap().len(), 2);
    assert!(snapshot["taxonomy"].is_array());
    assert!(snapshot["userGuide"].is_string());

    // Load the snapshot into a fresh service
    let (fresh_app, fresh_state) = setup_app(Arc::new(ScriptedGateway::new()));
    let response = fresh_app
        .clone()
        .oneshot(json_request("POST", "/workspace", snapshot))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["article_count"], 2);
    assert_eq!(body["state"], "ready");
    assert_eq!(
        fresh_state.session.read().await.state,
        resdesk_common::model::SessionState::Ready
    );

    let response = fresh_app
        .oneshot(empty_request("GET", "/articles"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["articles"][0]["title"], "paper_a.txt");
}

#[tokio::test]
async fn test_workspace_load_requires_articles_key() {
    let (app, _state) = setup_app(Arc::new(ScriptedGateway::new()));

    let response = app
        .oneshot(json_request(
            "POST",
            "/workspace",
            json!({ "taxonomy": ["Grazing"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bibliography_sorted_by_author() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_taxonomy(&["Grazing", "Soils", "Unsorted"]);
    // Script authors out of order to observe the sort
    gateway.push_ok(
        json!({
            "selectedTags": ["Grazing"],
            "alignment": "Neutral",
            "realTitle": "Paper A",
            "year": "2021",
            "authors": "ZIMMER, K.",
            "fullAbstract": "A",
            "mainPoints": "",
            "conclusions": "",
            "quotes": [],
            "abntDraft": "ZIMMER, K. Paper A. 2021.",
        })
        .to_string(),
    );
    gateway.push_ok(
        json!({
            "selectedTags": ["Soils"],
            "alignment": "Neutral",
            "realTitle": "Paper B",
            "year": "2019",
            "authors": "ALMEIDA, R.",
            "fullAbstract": "B",
            "mainPoints": "",
            "conclusions": "",
            "quotes": [],
            "abntDraft": "ALMEIDA, R. Paper B. 2019.",
        })
        .to_string(),
    );
    let (app, state) = setup_app(gateway);

    app.clone()
        .oneshot(json_request("POST", "/session/start", start_request_body()))
        .await
        .unwrap();
    wait_until_ready(&state).await;

    let response = app
        .oneshot(empty_request("GET", "/bibliography"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].as_str().unwrap().starts_with("ALMEIDA"));
    assert!(entries[1].as_str().unwrap().starts_with("ZIMMER"));
}
