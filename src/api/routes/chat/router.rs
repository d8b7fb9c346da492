//! Router for the chat API

use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use super::public;
use crate::api::public::{ApiError, ErrorResponse};
use crate::api::state::AppState;
use crate::openai::CompletionError;

type SharedState = Arc<RwLock<AppState>>;

fn not_found(id: &str) -> Response {
    ErrorResponse::response(
        StatusCode::NOT_FOUND,
        &format!("Chat session {} not found", id),
    )
}

/// Ask a question in a new or existing session. Provider failures
/// still respond 200 with the error text as the reply so clients can
/// render it like any other answer.
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<Response, ApiError> {
    // Reject before a session is created or anything is sent
    if payload.message.trim().is_empty() {
        return Ok(ErrorResponse::response(
            StatusCode::BAD_REQUEST,
            &CompletionError::EmptyInput.user_message(),
        ));
    }

    let (chat, conversation) = {
        let mut shared_state = state
            .write()
            .map_err(|_| anyhow!("Unable to write shared state"))?;
        let chat = match shared_state
            .chat
            .with_settings(payload.model.as_deref(), payload.temperature)
        {
            Ok(chat) => chat,
            Err(e) => {
                return Ok(ErrorResponse::response(
                    StatusCode::BAD_REQUEST,
                    &e.to_string(),
                ));
            }
        };
        let conversation = shared_state.session_or_new(payload.session_id.as_deref());
        (chat, conversation)
    };

    let mut conversation = conversation.lock().await;
    let outcome = chat.turn(&mut conversation, &payload.message).await;

    Ok(axum::Json(public::ChatResponse {
        session_id: conversation.session_id().to_string(),
        success: outcome.success(),
        reply: outcome.reply,
    })
    .into_response())
}

/// Get the transcript for a session
async fn chat_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let conversation = state
        .read()
        .map_err(|_| anyhow!("Unable to read shared state"))?
        .session(&id);
    let Some(conversation) = conversation else {
        return Ok(not_found(&id));
    };

    let conversation = conversation.lock().await;
    Ok(axum::Json(public::ChatTranscriptResponse {
        session_id: conversation.session_id().to_string(),
        transcript: conversation.messages().to_vec(),
    })
    .into_response())
}

/// End a session. Its id stops resolving immediately.
async fn chat_end(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let ended = state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?
        .end_session(&id);
    match ended {
        Some(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        None => Ok(not_found(&id)),
    }
}

/// Restart a session's history under a new id. `reset` zeroes the
/// token counter while `clear` keeps it.
async fn restart(
    state: SharedState,
    id: String,
    keep_tokens: bool,
) -> Result<Response, ApiError> {
    let conversation = state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?
        .end_session(&id);
    let Some(conversation) = conversation else {
        return Ok(not_found(&id));
    };

    let new_id = {
        let mut guard = conversation.lock().await;
        if keep_tokens {
            guard.clear();
        } else {
            guard.reset();
        }
        guard.session_id().to_string()
    };
    state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?
        .adopt(new_id.clone(), conversation);

    Ok(axum::Json(public::ResetResponse { session_id: new_id }).into_response())
}

async fn chat_reset(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    restart(state, id, false).await
}

async fn chat_clear(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    restart(state, id, true).await
}

/// Message and token counts for a session
async fn chat_stats(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let conversation = state
        .read()
        .map_err(|_| anyhow!("Unable to read shared state"))?
        .session(&id);
    let Some(conversation) = conversation else {
        return Ok(not_found(&id));
    };

    let conversation = conversation.lock().await;
    Ok(axum::Json(public::ChatStatsResponse {
        session_id: conversation.session_id().to_string(),
        stats: conversation.stats(),
    })
    .into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/{id}", get(chat_session).delete(chat_end))
        .route("/{id}/reset", post(chat_reset))
        .route("/{id}/clear", post(chat_clear))
        .route("/{id}/stats", get(chat_stats))
}
