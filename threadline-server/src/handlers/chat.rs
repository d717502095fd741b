//! The chat submission endpoint.

use std::sync::Arc;

use axum::{Json, Router, extract::Extension, routing::post};
use tracing::instrument;

use shared::models::{ChatRequest, ChatResponse};
use shared::thread_ref::ThreadRef;

use crate::{
    app_state::AppState,
    handlers::require_user,
    http::error::AppResult,
    middleware::request_context::RequestContext,
};

pub fn routes() -> Router {
    Router::new().route("/api/chat", post(chat))
}

#[instrument(skip(app_state, context, payload))]
async fn chat(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let user_id = require_user(&context)?;

    let thread_ref = ThreadRef::parse(&payload.thread_id);
    let outcome = app_state
        .chat
        .handle_chat(user_id, Some(thread_ref), &payload.message)
        .await?;

    metrics::counter!("chat_messages_total").increment(1);

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        thread_id: outcome.thread_id,
    }))
}
