//! Legacy session labels
//!
//! Older documents store cells as `"Subject (Teacher)"` strings with `""` for
//! an empty cell. Those are converted once at load time; nothing past the
//! loader ever sees a string label.

use thiserror::Error;

use crate::{ClassName, Session};

/// A stored label that does not parse into (subject, teacher)
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Skipped malformed label {label:?} in {class} on {day} Pd {}", .period + 1)]
pub struct MalformedLabel {
    pub class: ClassName,
    pub day: String,
    /// Zero-based period index
    pub period: usize,
    pub label: String,
}

/// Parse a legacy label. `Ok(None)` is an empty cell.
///
/// The teacher is the text inside the final parenthesised group; everything
/// before it is the subject. Both must be non-empty.
pub(crate) fn parse_label(label: &str) -> Result<Option<Session>, ()> {
    let label = label.trim();
    if label.is_empty() {
        return Ok(None);
    }

    let inner = label.strip_suffix(')').ok_or(())?;
    let open = inner.rfind('(').ok_or(())?;
    let subject = inner[..open].trim();
    let teacher = inner[open + 1..].trim();

    if subject.is_empty() || teacher.is_empty() {
        return Err(());
    }
    Ok(Some(Session::new(subject, teacher)))
}
