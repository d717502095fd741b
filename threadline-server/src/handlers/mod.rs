pub mod auth;
pub mod chat;
pub mod health;
pub mod threads;

use uuid::Uuid;

use crate::http::error::ApiError;
use crate::middleware::request_context::RequestContext;

/// The authenticated user, or 401 when the auth middleware did not run.
pub(crate) fn require_user(context: &RequestContext) -> Result<Uuid, ApiError> {
    context
        .user_id
        .ok_or_else(|| ApiError::unauthorized("Missing token"))
}
