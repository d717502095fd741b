//! Reconciles the server's thread list with locally-held session threads.
//!
//! The server copy is authoritative, with two exceptions the optimistic UI
//! depends on: non-empty local messages survive an empty server message list
//! (the server may return summaries without bodies), and a non-empty local
//! title survives a blank server title. Provisional threads the server has
//! never seen are always kept.

use shared::models::Message;
use shared::thread_ref::ThreadRef;
use shared::title::sanitize;

/// One sidebar entry as the client holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub id: ThreadRef,
    pub title: String,
    pub messages: Vec<Message>,
}

impl ThreadEntry {
    /// A fresh provisional entry with no messages.
    #[must_use]
    pub fn provisional(title: impl Into<String>) -> Self {
        Self {
            id: ThreadRef::new_local(),
            title: title.into(),
            messages: Vec::new(),
        }
    }
}

/// Merges `server` (authoritative) with `local` (the session's current list).
///
/// Provisional entries sort stably before all others; server order is
/// preserved for the rest, followed by local canonical entries the server
/// does not know. Idempotent: merging a merged list against the same server
/// list changes nothing beyond what the first merge did.
#[must_use]
pub fn merge_thread_lists(server: &[ThreadEntry], local: &[ThreadEntry]) -> Vec<ThreadEntry> {
    let mut merged: Vec<ThreadEntry> = local
        .iter()
        .filter(|entry| entry.id.is_local())
        .cloned()
        .collect();

    for server_entry in server {
        let counterpart = local.iter().find(|entry| entry.id == server_entry.id);
        merged.push(reconcile(server_entry, counterpart));
    }

    // Canonical entries the server list omitted; kept as-is.
    for entry in local {
        if !entry.id.is_local() && !server.iter().any(|s| s.id == entry.id) {
            merged.push(entry.clone());
        }
    }

    merged
}

fn reconcile(server: &ThreadEntry, local: Option<&ThreadEntry>) -> ThreadEntry {
    let Some(local) = local else {
        return server.clone();
    };

    let title = if sanitize(&server.title).is_empty() && !sanitize(&local.title).is_empty() {
        local.title.clone()
    } else {
        server.title.clone()
    };

    let messages = if server.messages.is_empty() && !local.messages.is_empty() {
        local.messages.clone()
    } else {
        server.messages.clone()
    };

    ThreadEntry {
        id: server.id.clone(),
        title,
        messages,
    }
}
