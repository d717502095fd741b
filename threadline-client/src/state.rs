//! Reducer-style session state: the sidebar list plus the currently selected
//! thread, advanced one [`Action`] at a time.
//!
//! The optimistic flow is: `CreateLocalThread` inserts a provisional entry and
//! selects it, `AppendMessage` records the user's text immediately, and once
//! the server replies `PromoteToCanonical` rewrites every reference to the
//! provisional id in one step. On failure nothing is rolled back; the entry
//! simply stays provisional.

use shared::models::Message;
use shared::thread_ref::ThreadRef;

use crate::merge::{ThreadEntry, merge_thread_lists};

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub threads: Vec<ThreadEntry>,
    pub current: Option<ThreadRef>,
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Insert a provisional thread at the front and select it.
    CreateLocalThread { title: String },
    /// Rewrite every reference to `temp_id` to the canonical `id`.
    PromoteToCanonical { temp_id: ThreadRef, id: String },
    /// Reconcile the sidebar with a freshly fetched server list.
    MergeServerList { server: Vec<ThreadEntry> },
    /// Record a message on a thread.
    AppendMessage { id: ThreadRef, message: Message },
    /// Point the session at a thread already in the list.
    SelectThread { id: ThreadRef },
    /// Replace a thread's messages with the authoritative server body.
    ThreadLoaded { id: ThreadRef, messages: Vec<Message> },
    /// Drop a thread (after a server-side delete).
    RemoveThread { id: ThreadRef },
    /// Clear everything (logout).
    Reset,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry the session currently points at.
    #[must_use]
    pub fn current_thread(&self) -> Option<&ThreadEntry> {
        let current = self.current.as_ref()?;
        self.threads.iter().find(|entry| &entry.id == current)
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::CreateLocalThread { title } => {
                let entry = ThreadEntry::provisional(title);
                self.current = Some(entry.id.clone());
                self.threads.insert(0, entry);
            }
            Action::PromoteToCanonical { temp_id, id } => {
                let canonical = ThreadRef::Canonical(id);
                if let Some(entry) = self.threads.iter_mut().find(|e| e.id == temp_id) {
                    entry.id = canonical.clone();
                }
                if self.current.as_ref() == Some(&temp_id) {
                    self.current = Some(canonical);
                }
            }
            Action::MergeServerList { server } => {
                self.threads = merge_thread_lists(&server, &self.threads);
                if let Some(current) = &self.current {
                    if !self.threads.iter().any(|e| &e.id == current) {
                        self.current = None;
                    }
                }
            }
            Action::AppendMessage { id, message } => {
                if let Some(entry) = self.threads.iter_mut().find(|e| e.id == id) {
                    entry.messages.push(message);
                }
            }
            Action::SelectThread { id } => {
                if self.threads.iter().any(|e| e.id == id) {
                    self.current = Some(id);
                }
            }
            Action::ThreadLoaded { id, messages } => {
                if let Some(entry) = self.threads.iter_mut().find(|e| e.id == id) {
                    entry.messages = messages;
                }
            }
            Action::RemoveThread { id } => {
                self.threads.retain(|e| e.id != id);
                if self.current.as_ref() == Some(&id) {
                    self.current = None;
                }
            }
            Action::Reset => {
                self.threads.clear();
                self.current = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_entry(id: &str, title: &str) -> ThreadEntry {
        ThreadEntry {
            id: ThreadRef::Canonical(id.into()),
            title: title.into(),
            messages: Vec::new(),
        }
    }

    #[test]
    fn create_local_thread_selects_the_placeholder() {
        let mut state = SessionState::new();
        state.apply(Action::CreateLocalThread {
            title: "Draft".into(),
        });

        assert_eq!(state.threads.len(), 1);
        assert!(state.threads[0].id.is_local());
        assert_eq!(state.current, Some(state.threads[0].id.clone()));
    }

    #[test]
    fn promote_rewrites_the_list_entry_and_the_current_pointer() {
        let mut state = SessionState::new();
        state.apply(Action::CreateLocalThread {
            title: "Draft".into(),
        });
        let temp_id = state.current.clone().unwrap();

        state.apply(Action::PromoteToCanonical {
            temp_id,
            id: "t-42".into(),
        });

        let expected = ThreadRef::Canonical("t-42".into());
        assert_eq!(state.threads[0].id, expected);
        assert_eq!(state.current, Some(expected));
    }

    #[test]
    fn promote_preserves_optimistic_messages() {
        let mut state = SessionState::new();
        state.apply(Action::CreateLocalThread {
            title: String::new(),
        });
        let temp_id = state.current.clone().unwrap();

        state.apply(Action::AppendMessage {
            id: temp_id.clone(),
            message: Message::user("hello"),
        });
        state.apply(Action::PromoteToCanonical {
            temp_id,
            id: "t-1".into(),
        });

        let entry = state.current_thread().unwrap();
        assert_eq!(entry.messages.len(), 1);
        assert_eq!(entry.messages[0].content, "hello");
    }

    #[test]
    fn merge_keeps_the_provisional_thread_and_selection() {
        let mut state = SessionState::new();
        state.apply(Action::CreateLocalThread {
            title: "Draft".into(),
        });

        state.apply(Action::MergeServerList {
            server: vec![canonical_entry("t-1", "From server")],
        });

        assert_eq!(state.threads.len(), 2);
        assert!(state.threads[0].id.is_local());
        assert!(state.current.is_some());
    }

    #[test]
    fn merge_clears_selection_when_the_thread_vanished() {
        let mut state = SessionState::new();
        state.apply(Action::MergeServerList {
            server: vec![canonical_entry("t-1", "One")],
        });
        state.apply(Action::SelectThread {
            id: ThreadRef::Canonical("t-1".into()),
        });

        state.apply(Action::MergeServerList { server: vec![] });
        // t-1 was canonical-local and absent from the server: still kept.
        assert_eq!(state.threads.len(), 1);
        assert!(state.current.is_some());

        state.apply(Action::RemoveThread {
            id: ThreadRef::Canonical("t-1".into()),
        });
        assert!(state.threads.is_empty());
        assert!(state.current.is_none());
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut state = SessionState::new();
        state.apply(Action::SelectThread {
            id: ThreadRef::Canonical("ghost".into()),
        });
        assert!(state.current.is_none());
    }

    #[test]
    fn thread_loaded_replaces_messages() {
        let mut state = SessionState::new();
        state.apply(Action::MergeServerList {
            server: vec![canonical_entry("t-1", "One")],
        });

        state.apply(Action::ThreadLoaded {
            id: ThreadRef::Canonical("t-1".into()),
            messages: vec![Message::user("a"), Message::assistant("b")],
        });

        assert_eq!(state.threads[0].messages.len(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = SessionState::new();
        state.apply(Action::CreateLocalThread {
            title: "Draft".into(),
        });
        state.apply(Action::Reset);
        assert!(state.threads.is_empty());
        assert!(state.current.is_none());
    }
}
