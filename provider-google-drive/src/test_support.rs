//! Shared fixtures for unit tests.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::{
    ConsentMode, IdentityLibrary, NotificationSink, Severity, TokenClient, TokenClientConfig,
    TokenResponse,
};
use core_auth::TokenManager;
use core_runtime::config::DriveConfig;
use core_runtime::events::EventBus;
use mockall::mock;
use std::sync::Arc;

pub const DRIVE_BASE: &str = "https://drive.test/drive/v3";
pub const UPLOAD_BASE: &str = "https://drive.test/upload/drive/v3";

mock! {
    pub HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

struct GrantingClient(String);

#[async_trait]
impl TokenClient for GrantingClient {
    async fn request_access_token(&self, _mode: ConsentMode) -> TokenResponse {
        TokenResponse::Granted {
            access_token: self.0.clone(),
            expires_in: Some(3599),
        }
    }
}

struct LoadedIdentity(String);

#[async_trait]
impl IdentityLibrary for LoadedIdentity {
    fn has_static_tag(&self) -> bool {
        true
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn inject(&self) -> BridgeResult<()> {
        Ok(())
    }

    fn create_token_client(&self, _config: TokenClientConfig) -> BridgeResult<Arc<dyn TokenClient>> {
        Ok(Arc::new(GrantingClient(self.0.clone())))
    }
}

struct QuietSink;

impl NotificationSink for QuietSink {
    fn notify(&self, _severity: Severity, _message: &str) {}
}

pub fn test_config() -> DriveConfig {
    DriveConfig::builder()
        .client_id("test-client.apps.googleusercontent.com")
        .drive_api_base(DRIVE_BASE)
        .upload_api_base(UPLOAD_BASE)
        .build()
        .unwrap()
}

/// A token manager already holding `token`.
pub async fn authenticated_tokens(token: &str) -> (Arc<TokenManager>, DriveConfig) {
    let config = test_config();
    let tokens = Arc::new(TokenManager::new(
        config.clone(),
        Arc::new(LoadedIdentity(token.to_string())),
        Arc::new(QuietSink),
        EventBus::default(),
    ));
    tokens.initialize().await.unwrap();
    tokens.request_silent_token().await.unwrap();
    (tokens, config)
}

pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string())
}
