//! Host Hooks
//!
//! Collaborators the core calls into but does not own: the toast area, the
//! ledger document held in memory, and the surrounding page chrome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity tag of a user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Sink for one-line user-visible messages (toasts).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// The in-memory document the user is editing.
///
/// The document's schema belongs to the host; the core only moves it to and
/// from Drive as JSON.
pub trait DocumentStore: Send + Sync {
    /// Current document content
    fn snapshot(&self) -> Value;

    /// Replace the document with content loaded from `file_name`
    fn replace(&self, document: Value, file_name: &str);

    /// Record the remote name the document is now saved under
    fn set_file_name(&self, file_name: &str);
}

/// Page chrome reacting to document lifecycle changes.
pub trait WorkspaceView: Send + Sync {
    /// Re-render everything derived from the document
    fn refresh(&self);

    /// Clear the "unsaved changes" marker
    fn mark_saved(&self);

    /// Update the displayed document filename
    fn show_file_name(&self, file_name: &str);
}
