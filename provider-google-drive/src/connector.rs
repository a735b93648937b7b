//! Google Drive API connector
//!
//! Authenticated request plumbing shared by the folder resolver, the file
//! catalog and the content transfer.
//!
//! Every response goes through one policy, in this order:
//!
//! 1. `401` discards the session token and fails with `SessionExpired`
//! 2. a body carrying a Drive `error` object fails with `ApiError`
//! 3. any other non-2xx status fails with `TransferFailed`
//! 4. a 2xx body that does not decode fails with `ParseError`
//!
//! Requests are sent once. There is no retry or backoff.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::TokenManager;
use core_runtime::config::DriveConfig;
use core_runtime::events::{CoreEvent, DriveEvent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{GoogleDriveError, Result};

/// Google Drive API connector
///
/// Attaches the session's bearer token to each request and applies the
/// shared response policy.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::DriveConnector;
///
/// let connector = DriveConnector::new(http_client, token_manager, &config);
/// let request = HttpRequest::new(HttpMethod::Get, connector.drive_url("files?q=..."));
/// let listing: FilesListResponse = connector.send_json(request, "List").await?;
/// ```
pub struct DriveConnector {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<TokenManager>,
    drive_api_base: String,
    upload_api_base: String,
}

impl DriveConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<TokenManager>,
        config: &DriveConfig,
    ) -> Self {
        Self {
            http_client,
            tokens,
            drive_api_base: config.drive_api_base.clone(),
            upload_api_base: config.upload_api_base.clone(),
        }
    }

    /// Metadata endpoint URL for `path` (no leading slash)
    pub fn drive_url(&self, path: &str) -> String {
        format!("{}/{}", self.drive_api_base, path)
    }

    /// Upload endpoint URL for `path` (no leading slash)
    pub fn upload_url(&self, path: &str) -> String {
        format!("{}/{}", self.upload_api_base, path)
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Publish a Drive event; having no subscriber is fine.
    pub(crate) fn emit(&self, event: DriveEvent) {
        let _ = self.tokens.event_bus().emit(CoreEvent::Drive(event));
    }

    /// Send `request` with the session token.
    ///
    /// Only the 401 rule of the response policy is applied here; callers
    /// inspect the status themselves.
    ///
    /// # Errors
    ///
    /// - [`GoogleDriveError::NotAuthenticated`] if no token is cached; the
    ///   request is not sent
    /// - [`GoogleDriveError::SessionExpired`] on 401
    /// - [`GoogleDriveError::Bridge`] if the request produced no response
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self
            .tokens
            .current_token()
            .ok_or(GoogleDriveError::NotAuthenticated)?;

        let request = request
            .bearer_token(token.secret())
            .header("Accept", "application/json");
        let response = self.http_client.execute(request).await?;
        debug!(status = response.status, bytes = response.body.len(), "Drive response");

        if response.status == 401 {
            warn!("Drive rejected the access token");
            self.tokens.invalidate();
            return Err(GoogleDriveError::SessionExpired);
        }

        Ok(response)
    }

    /// Send `request` and decode a JSON response under the full policy.
    ///
    /// `operation` names the call in `TransferFailed` messages ("Upload",
    /// "Rename", ...).
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        operation: &str,
    ) -> Result<T> {
        let response = self.send(request).await?;
        decode_response(&response, operation)
    }
}

/// Apply the error-object, status and decode rules to `response`.
pub(crate) fn decode_response<T: DeserializeOwned>(
    response: &HttpResponse,
    operation: &str,
) -> Result<T> {
    let parsed = serde_json::from_slice::<Value>(&response.body);

    if let Ok(Value::Object(map)) = &parsed {
        if let Some(error) = map.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            warn!(status = response.status, message = %message, "Drive API error");
            return Err(GoogleDriveError::ApiError {
                status: response.status,
                message,
            });
        }
    }

    if !response.is_success() {
        warn!(status = response.status, operation, "Drive request failed");
        return Err(GoogleDriveError::TransferFailed {
            operation: operation.to_string(),
            status: response.status,
        });
    }

    let value = parsed.map_err(|e| GoogleDriveError::ParseError(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| GoogleDriveError::ParseError(e.to_string()))
}

/// Request helper for JSON endpoints
pub(crate) fn get(url: String) -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{authenticated_tokens, MockHttpClient};
    use crate::types::FilesListResponse;
    use core_auth::TokenStatus;

    async fn connector(mock: MockHttpClient) -> DriveConnector {
        let (tokens, config) = authenticated_tokens("test_token").await;
        DriveConnector::new(Arc::new(mock), tokens, &config)
    }

    #[tokio::test]
    async fn test_send_attaches_bearer_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .withf(|req| req.header_value("Authorization") == Some("Bearer test_token"))
            .returning(|_| Ok(HttpResponse::new(200, r#"{"files":[]}"#)));

        let connector = connector(mock_http).await;
        let listing: FilesListResponse = connector
            .send_json(get(connector.drive_url("files")), "List")
            .await
            .unwrap();

        assert!(listing.files.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_invalidates_session() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(401, r#"{"error":{"message":"Invalid Credentials"}}"#)));

        let connector = connector(mock_http).await;
        let result: Result<FilesListResponse> = connector
            .send_json(get(connector.drive_url("files")), "List")
            .await;

        assert!(matches!(result, Err(GoogleDriveError::SessionExpired)));
        assert_eq!(connector.tokens().status(), TokenStatus::Expired);
        assert!(connector.tokens().current_token().is_none());
    }

    #[tokio::test]
    async fn test_no_request_without_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let connector = connector(mock_http).await;
        connector.tokens().invalidate();

        let result = connector.send(get(connector.drive_url("files"))).await;
        assert!(matches!(result, Err(GoogleDriveError::NotAuthenticated)));
    }

    #[test]
    fn test_error_object_wins_over_status() {
        let response = HttpResponse::new(
            403,
            r#"{"error":{"code":403,"message":"Insufficient permissions"}}"#,
        );
        let result: Result<Value> = decode_response(&response, "List");
        match result {
            Err(GoogleDriveError::ApiError { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Insufficient permissions");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_error_object_without_message_is_serialized() {
        let response = HttpResponse::new(200, r#"{"error":"quota"}"#);
        let result: Result<Value> = decode_response(&response, "Upload");
        match result {
            Err(GoogleDriveError::ApiError { message, .. }) => assert_eq!(message, "\"quota\""),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_non_success_without_error_object() {
        let response = HttpResponse::new(502, "<html>Bad Gateway</html>");
        let result: Result<Value> = decode_response(&response, "Rename");
        match result {
            Err(err @ GoogleDriveError::TransferFailed { .. }) => {
                assert_eq!(err.to_string(), "Rename failed: 502");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_success_body() {
        let response = HttpResponse::new(200, "not json");
        let result: Result<FilesListResponse> = decode_response(&response, "List");
        assert!(matches!(result, Err(GoogleDriveError::ParseError(_))));

        let response = HttpResponse::new(200, r#"{"files": 3}"#);
        let result: Result<FilesListResponse> = decode_response(&response, "List");
        assert!(matches!(result, Err(GoogleDriveError::ParseError(_))));
    }
}
