use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Message, Timestamp};

/// A persisted conversation thread between a user and the assistant.
///
/// `thread_id` is an opaque string: the store treats caller-supplied
/// identifiers and its own generated ones the same way. Ownership is fixed at
/// creation and every store operation is scoped by it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thread {
    /// Opaque thread identifier, unique within the store.
    pub thread_id: String,

    /// The owning user. Immutable after creation.
    pub owner_id: Uuid,

    /// Display title. May be blank, in which case clients derive one from the
    /// first message.
    pub title: String,

    /// Append-only message list, insertion order = conversation order.
    pub messages: Vec<Message>,

    /// Refreshed on every append or title change; orders the thread list.
    pub updated_at: Timestamp,
}

impl Thread {
    /// Creates an empty thread owned by `owner_id`.
    #[must_use]
    pub fn new(owner_id: Uuid, thread_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            owner_id,
            title: title.into(),
            messages: Vec::new(),
            updated_at: Timestamp::now(),
        }
    }
}

/// Sidebar listing entry: `GET /api/thread` returns these, most recently
/// updated first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub title: String,
    pub message_count: usize,
}

/// Full thread view returned by `GET /api/thread/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadDetail {
    pub thread_id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

/// Request body for `POST /api/thread`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateThreadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Request body for `PUT /api/thread/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameThreadRequest {
    pub title: String,
}

/// Response body for `DELETE /api/thread/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteThreadResponse {
    pub success: String,
}
