//! Moving documents between Drive text and the host's in-memory copy.

use bridge_traits::{DocumentStore, WorkspaceView};
use serde_json::Value;

use crate::error::{Result, SyncError};

/// Parse downloaded content. Nothing is touched if this fails.
pub fn parse_document(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| SyncError::InvalidDocument(e.to_string()))
}

/// Serialize the current document the way it is stored on Drive.
pub fn render_document(document: &Value) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(|e| SyncError::Serialization(e.to_string()))
}

/// Replace the in-memory document with freshly loaded content.
pub(crate) fn install_document(
    store: &dyn DocumentStore,
    view: &dyn WorkspaceView,
    document: Value,
    file_name: &str,
) {
    store.replace(document, file_name);
    view.show_file_name(file_name);
    view.mark_saved();
    view.refresh();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_document() {
        assert_eq!(parse_document(r#"{"entries":[]}"#).unwrap(), json!({"entries": []}));
        assert!(matches!(
            parse_document("{not json"),
            Err(SyncError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_render_is_two_space_pretty() {
        let rendered = render_document(&json!({"a": [1]})).unwrap();
        assert_eq!(rendered, "{\n  \"a\": [\n    1\n  ]\n}");
    }
}
