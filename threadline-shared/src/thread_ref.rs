use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix that marks a client-generated provisional identifier on the wire.
pub const LOCAL_PREFIX: &str = "local-";

/// A thread identifier in one of its two id spaces.
///
/// Clients mint `Local` identifiers when they insert a placeholder thread
/// before the store has confirmed anything; the store only ever hands out
/// `Canonical` identifiers. A thread moves from `Local` to `Canonical` exactly
/// once, and the distinction is a type-level match rather than a string-prefix
/// test scattered through call sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreadRef {
    /// Provisional, client-only identifier. Never accepted by the store.
    Local(String),
    /// Store-assigned (or caller-generated and store-confirmed) identifier.
    Canonical(String),
}

impl ThreadRef {
    /// Mints a fresh provisional identifier.
    #[must_use]
    pub fn new_local() -> Self {
        ThreadRef::Local(Uuid::new_v4().to_string())
    }

    /// Mints a fresh canonical identifier, used when the caller supplies the
    /// id on first submission.
    #[must_use]
    pub fn new_canonical() -> Self {
        ThreadRef::Canonical(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, ThreadRef::Local(_))
    }

    /// Parses a wire identifier, classifying by the provisional prefix.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(LOCAL_PREFIX) {
            Some(rest) => ThreadRef::Local(rest.to_string()),
            None => ThreadRef::Canonical(raw.to_string()),
        }
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadRef::Local(id) => write!(f, "{LOCAL_PREFIX}{id}"),
            ThreadRef::Canonical(id) => write!(f, "{id}"),
        }
    }
}

impl From<String> for ThreadRef {
    fn from(raw: String) -> Self {
        ThreadRef::parse(&raw)
    }
}

impl From<ThreadRef> for String {
    fn from(thread_ref: ThreadRef) -> Self {
        thread_ref.to_string()
    }
}
