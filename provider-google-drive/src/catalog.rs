//! Document listing

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::connector::{get, DriveConnector};
use crate::error::Result;
use crate::folder::{escape_query, FolderResolver};
use crate::types::{FileMetadata, FilesListResponse};

/// Lists the JSON documents in the application folder.
///
/// Every call queries Drive; nothing is cached.
pub struct FileCatalog {
    connector: Arc<DriveConnector>,
    folders: Arc<FolderResolver>,
    marker: String,
}

impl FileCatalog {
    /// `marker` is the substring a file name must contain to be listed.
    pub fn new(
        connector: Arc<DriveConnector>,
        folders: Arc<FolderResolver>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            folders,
            marker: marker.into(),
        }
    }

    /// Documents in the folder, most recently modified first.
    #[instrument(skip(self))]
    pub async fn list_files(&self) -> Result<Vec<FileMetadata>> {
        let folder_id = self.folders.ensure_folder().await?;

        let query = format!(
            "'{}' in parents and name contains '{}' and trashed=false",
            escape_query(&folder_id),
            escape_query(&self.marker)
        );
        let url = self.connector.drive_url(&format!(
            "files?q={}&fields={}&orderBy={}",
            urlencoding::encode(&query),
            urlencoding::encode("files(id,name,modifiedTime,size)"),
            urlencoding::encode("modifiedTime desc")
        ));

        let listing: FilesListResponse = self.connector.send_json(get(url), "List").await?;
        let mut files: Vec<FileMetadata> =
            listing.files.into_iter().map(FileMetadata::from).collect();
        // Stable: equal or missing timestamps keep Drive's order.
        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));

        debug!(count = files.len(), "Listed Drive documents");
        Ok(files)
    }

    /// The document named exactly `name` in the folder, newest first when
    /// several share the name.
    ///
    /// Looked up by name rather than through the listing, so a file whose
    /// name lacks the marker is still found.
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<FileMetadata>> {
        let folder_id = self.folders.ensure_folder().await?;

        let query = format!(
            "name='{}' and '{}' in parents and trashed=false",
            escape_query(name),
            escape_query(&folder_id)
        );
        let url = self.connector.drive_url(&format!(
            "files?q={}&fields={}&orderBy={}",
            urlencoding::encode(&query),
            urlencoding::encode("files(id,name,modifiedTime,size)"),
            urlencoding::encode("modifiedTime desc")
        ));

        let listing: FilesListResponse = self.connector.send_json(get(url), "List").await?;
        let mut files: Vec<FileMetadata> = listing
            .files
            .into_iter()
            .map(FileMetadata::from)
            .filter(|file| file.name == name)
            .collect();
        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        Ok(files.into_iter().next())
    }
}
