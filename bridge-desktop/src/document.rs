//! In-memory document store and workspace view.
//!
//! Holds the document for hosts without a UI of their own (CLI tools,
//! integration tests) and records what a page would have rendered.

use bridge_traits::host::{DocumentStore, WorkspaceView};
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct DocumentState {
    document: Value,
    file_name: Option<String>,
    displayed_name: Option<String>,
    dirty: bool,
    refreshes: usize,
}

#[derive(Debug)]
pub struct InMemoryDocumentStore {
    state: Mutex<DocumentState>,
}

impl InMemoryDocumentStore {
    pub fn new(document: Value) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                document,
                file_name: None,
                displayed_name: None,
                dirty: false,
                refreshes: 0,
            }),
        }
    }

    pub fn document(&self) -> Value {
        self.lock().document.clone()
    }

    /// Remote name the document is associated with
    pub fn file_name(&self) -> Option<String> {
        self.lock().file_name.clone()
    }

    /// Name last passed to `show_file_name`
    pub fn displayed_name(&self) -> Option<String> {
        self.lock().displayed_name.clone()
    }

    /// Whether there are changes since the last load or save
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    pub fn refresh_count(&self) -> usize {
        self.lock().refreshes
    }

    /// Modify the document as a user edit would.
    pub fn edit<F>(&self, change: F)
    where
        F: FnOnce(&mut Value),
    {
        let mut state = self.lock();
        change(&mut state.document);
        state.dirty = true;
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(json!({}))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn snapshot(&self) -> Value {
        self.document()
    }

    fn replace(&self, document: Value, file_name: &str) {
        let mut state = self.lock();
        state.document = document;
        state.file_name = Some(file_name.to_string());
    }

    fn set_file_name(&self, file_name: &str) {
        self.lock().file_name = Some(file_name.to_string());
    }
}

impl WorkspaceView for InMemoryDocumentStore {
    fn refresh(&self) {
        self.lock().refreshes += 1;
    }

    fn mark_saved(&self) {
        self.lock().dirty = false;
    }

    fn show_file_name(&self, file_name: &str) {
        self.lock().displayed_name = Some(file_name.to_string());
    }
}
