//! Application folder resolution

use bridge_traits::http::{HttpMethod, HttpRequest};
use core_runtime::events::DriveEvent;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

use crate::connector::{get, DriveConnector};
use crate::error::{GoogleDriveError, Result};
use crate::types::{DriveFile, FilesListResponse, NewFileMetadata, FOLDER_MIME_TYPE};

/// Finds or creates the fixed-name Drive folder holding the documents.
///
/// The folder id is cached for the session after the first resolution.
/// Two concurrent first calls may both miss the cache and both create a
/// folder; callers resolve the folder from one flow at a time.
pub struct FolderResolver {
    connector: Arc<DriveConnector>,
    folder_name: String,
    folder_id: Mutex<Option<String>>,
}

impl FolderResolver {
    pub fn new(connector: Arc<DriveConnector>, folder_name: impl Into<String>) -> Self {
        Self {
            connector,
            folder_name: folder_name.into(),
            folder_id: Mutex::new(None),
        }
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    /// Id of the application folder, creating the folder if Drive has none.
    #[instrument(skip(self), fields(folder = %self.folder_name))]
    pub async fn ensure_folder(&self) -> Result<String> {
        if let Some(id) = self.cached_folder_id() {
            return Ok(id);
        }

        let (id, created) = match self.find_folder().await? {
            Some(id) => (id, false),
            None => (self.create_folder().await?, true),
        };

        *self.lock() = Some(id.clone());
        info!(folder_id = %id, created, "Drive folder resolved");
        self.connector.emit(DriveEvent::FolderResolved {
            folder_id: id.clone(),
            created,
        });
        Ok(id)
    }

    pub fn cached_folder_id(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Drop the cached id so the next call resolves again.
    pub fn forget(&self) {
        self.lock().take();
    }

    async fn find_folder(&self) -> Result<Option<String>> {
        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            escape_query(&self.folder_name),
            FOLDER_MIME_TYPE
        );
        let url = self.connector.drive_url(&format!(
            "files?q={}&fields={}",
            urlencoding::encode(&query),
            urlencoding::encode("files(id,name)")
        ));

        let listing: FilesListResponse = self.connector.send_json(get(url), "List").await?;
        debug!(matches = listing.files.len(), "Folder lookup");
        Ok(listing.files.into_iter().next().map(|file| file.id))
    }

    async fn create_folder(&self) -> Result<String> {
        let metadata = NewFileMetadata {
            name: &self.folder_name,
            parents: None,
            mime_type: FOLDER_MIME_TYPE,
        };
        let request =
            HttpRequest::new(HttpMethod::Post, self.connector.drive_url("files")).json(&metadata)?;

        let created: DriveFile = self.connector.send_json(request, "Create folder").await?;
        if created.id.is_empty() {
            return Err(GoogleDriveError::ParseError(
                "folder created without an id".to_string(),
            ));
        }
        Ok(created.id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.folder_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Escape a literal for use inside single quotes in a Drive query.
pub fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
