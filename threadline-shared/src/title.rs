//! Display-title derivation for threads.
//!
//! Upstream serialization has historically injected the literal token
//! `undefined` into titles and message text; every title candidate passes
//! through [`sanitize`] before use so the artifact never reaches a client.

/// Maximum length of a title derived from message content, in characters.
pub const MAX_DERIVED_TITLE_CHARS: usize = 50;

/// Title used when neither a stored title nor a first message yields one.
pub const FALLBACK_TITLE: &str = "Untitled Chat";

const ARTIFACT: &str = "undefined";

/// Strips every case-insensitive occurrence of the `undefined` artifact and
/// BOM characters, collapses internal whitespace, and trims.
///
/// Idempotent: sanitizing an already-sanitized string yields the same string.
#[must_use]
pub fn sanitize(value: &str) -> String {
    let mut stripped = strip_artifact(value);
    // Stripping can splice a new occurrence together ("unde|undefined|fined"),
    // so run to a fixpoint.
    while contains_artifact(&stripped) {
        stripped = strip_artifact(&stripped);
    }

    let without_bom: String = stripped.chars().filter(|c| *c != '\u{feff}').collect();
    without_bom.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn contains_artifact(haystack: &str) -> bool {
    find_artifact(haystack).is_some()
}

// Byte offset of the first case-insensitive occurrence. The needle is pure
// ASCII, so a match always starts on a char boundary.
fn find_artifact(haystack: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(ARTIFACT.len())
        .position(|window| window.eq_ignore_ascii_case(ARTIFACT.as_bytes()))
}

fn strip_artifact(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = find_artifact(rest) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + ARTIFACT.len()..];
    }
    out.push_str(rest);
    out
}

/// Computes the display title for a thread.
///
/// The sanitized stored title wins when non-empty; otherwise the sanitized
/// first-message content truncated to [`MAX_DERIVED_TITLE_CHARS`]; otherwise
/// [`FALLBACK_TITLE`]. Pure, deterministic, and total: the result is never
/// empty.
#[must_use]
pub fn derive_title(stored_title: Option<&str>, first_message: Option<&str>) -> String {
    if let Some(stored) = stored_title {
        let clean = sanitize(stored);
        if !clean.is_empty() {
            return clean;
        }
    }

    if let Some(content) = first_message {
        let clean = sanitize(content);
        let truncated: String = clean.chars().take(MAX_DERIVED_TITLE_CHARS).collect();
        let trimmed = truncated.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    FALLBACK_TITLE.to_string()
}

/// Whether a stored title should be replaced by a freshly derived one: blank
/// titles and titles still carrying the artifact both qualify.
#[must_use]
pub fn needs_title_refresh(stored_title: &str) -> bool {
    stored_title.trim().is_empty() || contains_artifact(stored_title)
}
