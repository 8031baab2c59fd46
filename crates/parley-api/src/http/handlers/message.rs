//! Inbound message handler.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;

use parley_core::storage::kv_store::KvStore;
use parley_types::inbound::InboundMessage;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::http::router::HttpState;

/// Reply payload. `reply` is null when the assistant stays silent.
#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub reply: Option<String>,
}

/// POST /api/v1/messages - Deliver one inbound chat message.
pub async fn post_message<S: KvStore + 'static>(
    State(state): State<HttpState<S>>,
    body: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<ApiResponse<MessageReply>, AppError> {
    let start = Instant::now();
    let Json(message) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    if message.sender.user_id.trim().is_empty() {
        return Err(AppError::Validation("sender.user_id is required".to_string()));
    }

    let reply = state.dispatcher.handle(&message).await;
    tracing::debug!(
        user_id = %message.sender.user_id,
        replied = reply.is_some(),
        "inbound message handled"
    );

    Ok(ApiResponse::success(
        MessageReply { reply },
        start.elapsed().as_millis() as u64,
    ))
}
