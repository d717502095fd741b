//! Per-request context: a request id assigned at the edge, plus the
//! authenticated user once the auth middleware has run.

use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Set by the auth middleware; `None` on unauthenticated routes.
    pub user_id: Option<Uuid>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id: None,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Attaches a fresh [`RequestContext`] to every request.
pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestContext::new());
    next.run(request).await
}
