use crate::{
    chat::ChatMode,
    types::{
        AppError, ChatHistoryResponse, ChatModesResponse, ChatRequest, ChatResponse,
        ClearHistoryResponse, HistoryParams, Result,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};

/// Largest history page.
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Ask a question about the uploaded documents
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer with sources", body = ChatResponse),
        (status = 400, description = "Invalid message, mode or max_sources")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let limits = state.config_manager.config().chat.clone();

    let length = payload.message.chars().count();
    if payload.message.trim().is_empty() || length > limits.max_message_chars {
        return Err(AppError::InvalidInput(format!(
            "Message must be between 1 and {} characters",
            limits.max_message_chars
        )));
    }

    let mode = match payload.mode.as_deref() {
        Some(mode) => mode.parse::<ChatMode>()?,
        None => ChatMode::default(),
    };

    let max_sources = payload.max_sources.unwrap_or(limits.default_max_sources);
    if max_sources < 1 || max_sources > limits.max_sources_limit {
        return Err(AppError::InvalidInput(format!(
            "max_sources must be between 1 and {}",
            limits.max_sources_limit
        )));
    }

    let session_id = payload.session_id.filter(|s| !s.trim().is_empty());
    tracing::info!(mode = %mode, max_sources, new_session = session_id.is_none(), "Processing chat request");

    let response = state
        .chat
        .chat(&payload.message, session_id, mode, max_sources)
        .await?;

    Ok(Json(response))
}

/// Conversation history for a session, newest first
#[utoipa::path(
    get,
    path = "/api/chat/history/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session id"),
        HistoryParams
    ),
    responses(
        (status = 200, description = "History", body = ChatHistoryResponse),
        (status = 400, description = "Limit above 100")
    ),
    tag = "chat"
)]
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ChatHistoryResponse>> {
    if params.limit > MAX_HISTORY_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "Limit cannot exceed {}",
            MAX_HISTORY_LIMIT
        )));
    }

    let conversations = state.chat.history(&session_id, params.limit).await?;

    Ok(Json(ChatHistoryResponse {
        session_id,
        total: conversations.len(),
        conversations,
    }))
}

/// Delete a session's history
#[utoipa::path(
    delete,
    path = "/api/chat/history/{session_id}",
    params(("session_id" = String, Path, description = "Session id")),
    responses((status = 200, description = "History cleared", body = ClearHistoryResponse)),
    tag = "chat"
)]
pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ClearHistoryResponse>> {
    let deleted = state.chat.clear_history(&session_id).await?;

    Ok(Json(ClearHistoryResponse {
        message: format!("Chat history cleared for session {}", session_id),
        session_id,
        deleted,
    }))
}

/// Available chat modes
#[utoipa::path(
    get,
    path = "/api/chat/modes",
    responses((status = 200, description = "Mode catalogue", body = ChatModesResponse)),
    tag = "chat"
)]
pub async fn list_modes() -> Json<ChatModesResponse> {
    Json(ChatModesResponse {
        modes: ChatMode::catalogue(),
    })
}
