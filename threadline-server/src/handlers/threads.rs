//! Thread CRUD: create, list, fetch, rename, delete.
//!
//! Every operation runs against the authenticated owner; a thread another
//! user owns behaves exactly like one that does not exist.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use uuid::Uuid;

use shared::models::{
    CreateThreadRequest, DeleteThreadResponse, RenameThreadRequest, Thread, ThreadDetail,
    ThreadSummary,
};
use shared::title::{derive_title, sanitize};

use crate::{
    app_state::AppState,
    handlers::require_user,
    http::error::{ApiError, AppResult},
    middleware::request_context::RequestContext,
};

pub fn routes() -> Router {
    Router::new()
        .route("/api/thread", get(list_threads).post(create_thread))
        .route(
            "/api/thread/{id}",
            get(get_thread).put(rename_thread).delete(delete_thread),
        )
}

const DEFAULT_TITLE: &str = "New Chat";

fn summary_of(thread: &Thread) -> ThreadSummary {
    let first_message = thread.messages.first().map(|m| m.content.as_str());
    ThreadSummary {
        thread_id: thread.thread_id.clone(),
        title: derive_title(Some(&thread.title), first_message),
        message_count: thread.messages.len(),
    }
}

fn detail_of(thread: Thread) -> ThreadDetail {
    let first_message = thread.messages.first().map(|m| m.content.as_str());
    let title = derive_title(Some(&thread.title), first_message);
    ThreadDetail {
        thread_id: thread.thread_id,
        title,
        messages: thread.messages,
    }
}

#[instrument(skip(app_state, context, payload))]
async fn create_thread(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Json(payload): Json<CreateThreadRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user(&context)?;

    let title = payload
        .title
        .as_deref()
        .map(sanitize)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let thread = Thread::new(user_id, Uuid::new_v4().to_string(), title);
    let created = app_state.store.create_thread(thread).await?;

    Ok((StatusCode::CREATED, Json(detail_of(created))))
}

#[instrument(skip(app_state, context))]
async fn list_threads(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
) -> AppResult<Json<Vec<ThreadSummary>>> {
    let user_id = require_user(&context)?;
    let threads = app_state.store.list_threads(user_id).await?;
    Ok(Json(threads.iter().map(summary_of).collect()))
}

#[instrument(skip(app_state, context))]
async fn get_thread(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<String>,
) -> AppResult<Json<ThreadDetail>> {
    let user_id = require_user(&context)?;
    let thread = app_state
        .store
        .find_thread(user_id, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    Ok(Json(detail_of(thread)))
}

#[instrument(skip(app_state, context, payload))]
async fn rename_thread(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(payload): Json<RenameThreadRequest>,
) -> AppResult<Json<ThreadDetail>> {
    let user_id = require_user(&context)?;

    let title = sanitize(&payload.title);
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let renamed = app_state
        .store
        .rename_thread(user_id, &id, &title)
        .await?
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    Ok(Json(detail_of(renamed)))
}

#[instrument(skip(app_state, context))]
async fn delete_thread(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteThreadResponse>> {
    let user_id = require_user(&context)?;

    if !app_state.store.delete_thread(user_id, &id).await? {
        return Err(ApiError::not_found("Thread not found"));
    }

    Ok(Json(DeleteThreadResponse {
        success: "Thread deleted successfully".to_string(),
    }))
}
