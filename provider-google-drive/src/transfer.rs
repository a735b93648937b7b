//! Document content transfer
//!
//! Download, upload, rename and modification-time lookups for single files.
//! Uploads either replace the content of an existing file (media upload,
//! metadata untouched) or create a new file in the application folder
//! (multipart upload).

use bridge_traits::http::{HttpMethod, HttpRequest};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::connector::{get, DriveConnector};
use crate::error::{GoogleDriveError, Result};
use crate::folder::FolderResolver;
use crate::multipart::MultipartRelated;
use crate::types::{
    parse_timestamp, DriveFile, ModifiedTimeResponse, NewFileMetadata, RenameRequest,
    JSON_MIME_TYPE,
};

pub struct ContentTransfer {
    connector: Arc<DriveConnector>,
    folders: Arc<FolderResolver>,
}

impl ContentTransfer {
    pub fn new(connector: Arc<DriveConnector>, folders: Arc<FolderResolver>) -> Self {
        Self { connector, folders }
    }

    /// Raw content of file `id`, decoded as UTF-8 text.
    ///
    /// The body is returned as is: a downloaded document may legitimately
    /// contain an `error` key, so only the status code is checked.
    #[instrument(skip(self))]
    pub async fn download(&self, id: &str) -> Result<String> {
        let url = self
            .connector
            .drive_url(&format!("files/{}?alt=media", urlencoding::encode(id)));
        let response = self.connector.send(get(url)).await?;

        if !response.is_success() {
            warn!(status = response.status, "Download failed");
            return Err(GoogleDriveError::TransferFailed {
                operation: "Download".to_string(),
                status: response.status,
            });
        }

        debug!(bytes = response.body.len(), "Downloaded document");
        String::from_utf8(response.body.to_vec()).map_err(|err| {
            GoogleDriveError::ParseError(format!("Downloaded file is not valid UTF-8: {}", err))
        })
    }

    /// Write `content` to Drive and return the file id.
    ///
    /// With `existing_id` the file's content is replaced in place. Otherwise a
    /// new file named `name` is created in the application folder.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn upload(&self, name: &str, content: &str, existing_id: Option<&str>) -> Result<String> {
        let request = match existing_id {
            Some(id) => HttpRequest::new(
                HttpMethod::Patch,
                self.connector.upload_url(&format!(
                    "files/{}?uploadType=media",
                    urlencoding::encode(id)
                )),
            )
            .header("Content-Type", JSON_MIME_TYPE)
            .body(content.to_string().into()),
            None => {
                let folder_id = self.folders.ensure_folder().await?;
                let metadata = NewFileMetadata {
                    name,
                    parents: Some(vec![folder_id.as_str()]),
                    mime_type: JSON_MIME_TYPE,
                };
                let metadata = serde_json::to_vec(&metadata)
                    .map_err(|e| GoogleDriveError::ParseError(e.to_string()))?;

                let multipart = MultipartRelated::new()
                    .part("application/json; charset=UTF-8", metadata)
                    .part(JSON_MIME_TYPE, content.to_string())
                    .finish();

                HttpRequest::new(
                    HttpMethod::Post,
                    self.connector.upload_url("files?uploadType=multipart"),
                )
                .header("Content-Type", multipart.content_type())
                .body(multipart.body)
            }
        };

        let file: DriveFile = self.connector.send_json(request, "Upload").await?;
        info!(file_id = %file.id, replaced = existing_id.is_some(), "Uploaded document");
        Ok(file.id)
    }

    /// Rename file `id` to `new_name`.
    #[instrument(skip(self))]
    pub async fn rename(&self, id: &str, new_name: &str) -> Result<()> {
        let request = HttpRequest::new(
            HttpMethod::Patch,
            self.connector
                .drive_url(&format!("files/{}", urlencoding::encode(id))),
        )
        .json(&RenameRequest { name: new_name })?;

        let _: Value = self.connector.send_json(request, "Rename").await?;
        info!("Renamed document");
        Ok(())
    }

    /// Last modification time of file `id`.
    pub async fn modified_time(&self, id: &str) -> Result<DateTime<Utc>> {
        let url = self.connector.drive_url(&format!(
            "files/{}?fields=modifiedTime",
            urlencoding::encode(id)
        ));
        let response: ModifiedTimeResponse = self.connector.send_json(get(url), "Metadata").await?;

        parse_timestamp(&response.modified_time).ok_or_else(|| {
            GoogleDriveError::ParseError(format!(
                "invalid modifiedTime: {}",
                response.modified_time
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{authenticated_tokens, json_response, MockHttpClient};
    use bridge_traits::http::HttpResponse;
    use chrono::TimeZone;
    use serde_json::json;

    async fn transfer(mut mock: MockHttpClient) -> ContentTransfer {
        mock.expect_execute()
            .withf(|req| req.url.contains("application%2Fvnd.google-apps.folder"))
            .returning(|_| Ok(json_response(200, json!({"files": [{"id": "F1"}]}))));

        let (tokens, config) = authenticated_tokens("token").await;
        let connector = Arc::new(DriveConnector::new(Arc::new(mock), tokens, &config));
        let folders = Arc::new(FolderResolver::new(connector.clone(), "Accountable"));
        ContentTransfer::new(connector, folders)
    }

    #[tokio::test]
    async fn test_download_returns_raw_text() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|req| req.method == HttpMethod::Get && req.url.ends_with("/files/abc?alt=media"))
            .returning(|_| Ok(HttpResponse::new(200, r#"{"error":"not an api error"}"#)));

        let transfer = transfer(mock_http).await;
        assert_eq!(
            transfer.download("abc").await.unwrap(),
            r#"{"error":"not an api error"}"#
        );
    }

    #[tokio::test]
    async fn test_download_rejects_invalid_utf8() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("?alt=media"))
            .returning(|_| Ok(HttpResponse::new(200, b"{\"a\": \"\xff\"}".to_vec())));

        let transfer = transfer(mock_http).await;
        let err = transfer.download("abc").await.unwrap_err();
        assert!(matches!(err, GoogleDriveError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_download_status_failure() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("?alt=media"))
            .returning(|_| Ok(HttpResponse::new(404, "")));

        let transfer = transfer(mock_http).await;
        let err = transfer.download("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Download failed: 404");
    }

    #[tokio::test]
    async fn test_upload_existing_replaces_media() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|req| {
                req.method == HttpMethod::Patch
                    && req.url == "https://drive.test/upload/drive/v3/files/abc?uploadType=media"
                    && req.header_value("Content-Type") == Some("application/json")
                    && req.body.as_deref() == Some(br#"{"a":1}"#.as_slice())
            })
            .returning(|_| Ok(json_response(200, json!({"id": "abc"}))));

        let transfer = transfer(mock_http).await;
        let id = transfer.upload("data.json", r#"{"a":1}"#, Some("abc")).await.unwrap();
        assert_eq!(id, "abc");
    }

    #[tokio::test]
    async fn test_upload_new_uses_multipart() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|req| {
                let content_type = req.header_value("Content-Type").unwrap_or_default();
                let Some(boundary) = content_type.strip_prefix("multipart/related; boundary=") else {
                    return false;
                };
                let body = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default()).to_string();
                let expected = format!(
                    "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n\
                     {{\"name\":\"data.json\",\"parents\":[\"F1\"],\"mimeType\":\"application/json\"}}\r\n\
                     --{b}\r\nContent-Type: application/json\r\n\r\n{{\"a\":1}}\r\n--{b}--",
                    b = boundary
                );
                req.method == HttpMethod::Post
                    && req.url == "https://drive.test/upload/drive/v3/files?uploadType=multipart"
                    && body == expected
            })
            .returning(|_| Ok(json_response(200, json!({"id": "NEW"}))));

        let transfer = transfer(mock_http).await;
        let id = transfer.upload("data.json", r#"{"a":1}"#, None).await.unwrap();
        assert_eq!(id, "NEW");
    }

    #[tokio::test]
    async fn test_upload_api_error_message() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.contains("uploadType=media"))
            .returning(|_| {
                Ok(json_response(
                    403,
                    json!({"error": {"code": 403, "message": "The user's Drive storage quota has been exceeded."}}),
                ))
            });

        let transfer = transfer(mock_http).await;
        let err = transfer.upload("data.json", "{}", Some("abc")).await.unwrap_err();
        assert!(matches!(err, GoogleDriveError::ApiError { status: 403, .. }));
        assert_eq!(err.to_string(), "The user's Drive storage quota has been exceeded.");
    }

    #[tokio::test]
    async fn test_rename_patches_name() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|req| {
                req.method == HttpMethod::Patch
                    && req.url == "https://drive.test/drive/v3/files/abc"
                    && req.body.as_deref() == Some(br#"{"name":"data_2024-01-02.json"}"#.as_slice())
            })
            .returning(|_| Ok(json_response(200, json!({"id": "abc", "name": "data_2024-01-02.json"}))));

        let transfer = transfer(mock_http).await;
        transfer.rename("abc", "data_2024-01-02.json").await.unwrap();
    }

    #[tokio::test]
    async fn test_modified_time() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("/files/abc?fields=modifiedTime"))
            .returning(|_| Ok(json_response(200, json!({"modifiedTime": "2024-01-02T10:00:00.000Z"}))));

        let transfer = transfer(mock_http).await;
        assert_eq!(
            transfer.modified_time("abc").await.unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
        );
    }
}
