//! Corpus chat API handlers
//!
//! POST /chat, GET /chat

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, BusyGuard};
use resdesk_common::model::ChatMessage;

/// POST /chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// POST /chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: ChatMessage,
}

/// GET /chat response
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
}

/// POST /chat
///
/// One chat turn over the analyzed corpus. The model sees the last three
/// turns of history plus the full text of every article. Turns are
/// serialized; an overlapping request gets 409.
pub async fn chat_turn(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let question = req.text.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest(
            "Chat message must not be empty".to_string(),
        ));
    }

    let _guard = BusyGuard::claim(&state.chat_busy).ok_or_else(|| {
        ApiError::Conflict("A chat turn is already in progress".to_string())
    })?;

    // The prompt sees prior turns only; the question rides separately.
    let (articles, history) = {
        let library = state.library.read().await;
        if library.articles.is_empty() {
            return Err(ApiError::BadRequest(
                "No analyzed articles to chat about".to_string(),
            ));
        }
        (library.articles.clone(), library.chat_messages.clone())
    };

    let answer = state.analyst.chat(&articles, &history, &question).await;
    let reply = ChatMessage::ai(answer);
    // The turn lands in history only once complete, so a request dropped
    // mid-call leaves the transcript untouched.
    {
        let mut library = state.library.write().await;
        library.push_chat(ChatMessage::user(question));
        library.push_chat(reply.clone());
    }

    Ok(Json(ChatResponse { reply }))
}

/// GET /chat
///
/// Full chat transcript, including the seeded introduction.
pub async fn chat_history(State(state): State<AppState>) -> Json<ChatHistoryResponse> {
    let library = state.library.read().await;
    Json(ChatHistoryResponse {
        messages: library.chat_messages.clone(),
    })
}

/// Build chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat_turn))
        .route("/chat", get(chat_history))
}
