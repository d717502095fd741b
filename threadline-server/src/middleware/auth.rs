//! Bearer-token authentication for the `/api` surface.

use axum::{
    Extension,
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::app_state::AppState;
use crate::auth::credentials::TokenPurpose;
use crate::http::error::ApiError;
use crate::middleware::request_context::RequestContext;

/// Rejects the request unless it carries a valid session token, and records
/// the authenticated user on the [`RequestContext`].
///
/// # Errors
/// Returns 401 when the `Authorization` header is missing, not a bearer
/// scheme, or carries an invalid token.
pub async fn require_session(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Missing token"))?;

    let user_id = state.credentials.verify(token, TokenPurpose::Session)?;
    debug!(%user_id, "session verified");

    let mut context = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();
    context.user_id = Some(user_id);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
