use serde::{Deserialize, Serialize};

/// Request body for `POST /api/chat`.
///
/// `thread_id` may name an existing thread or a fresh caller-generated
/// identifier; the server creates the thread implicitly in the latter case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub thread_id: String,
    pub message: String,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub reply: String,
    /// The canonical identifier the submission resolved to. Differs from the
    /// request's `thread_id` when a provisional thread was promoted; clients
    /// use it to rebind their placeholder.
    pub thread_id: String,
}
