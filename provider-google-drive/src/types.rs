//! Google Drive API types
//!
//! Wire structures for the Drive v3 `files` resource and the metadata type
//! handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type of stored documents
pub const JSON_MIME_TYPE: &str = "application/json";

/// Google Drive API file resource (the subset requested via `fields`)
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Modification time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    /// Size in bytes, encoded by Drive as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Response of `files.get?fields=modifiedTime`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedTimeResponse {
    pub modified_time: String,
}

/// Metadata part of a multipart upload and body of `files.create`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFileMetadata<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<&'a str>>,
    pub mime_type: &'a str,
}

/// Body of a rename `files.patch`
#[derive(Debug, Serialize)]
pub struct RenameRequest<'a> {
    pub name: &'a str,
}

/// A document in the application folder.
///
/// Produced fresh by every catalog query; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    pub modified_time: Option<DateTime<Utc>>,
    pub size: Option<u64>,
}

impl FileMetadata {
    /// Size for display, in tenths of a kilobyte (`"1.5 KB"`).
    ///
    /// ```
    /// use provider_google_drive::FileMetadata;
    ///
    /// let file = FileMetadata { id: "1".into(), name: "data.json".into(), modified_time: None, size: Some(1536) };
    /// assert_eq!(file.size_label().as_deref(), Some("1.5 KB"));
    /// ```
    pub fn size_label(&self) -> Option<String> {
        let size = self.size?;
        let tenths = (size as f64 / 102.4).round() / 10.0;
        Some(format!("{} KB", tenths))
    }
}

impl From<DriveFile> for FileMetadata {
    fn from(file: DriveFile) -> Self {
        Self {
            modified_time: file.modified_time.as_deref().and_then(parse_timestamp),
            size: file.size.as_deref().and_then(|size| size.parse().ok()),
            id: file.id,
            name: file.name,
        }
    }
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(rfc3339: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(rfc3339)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
