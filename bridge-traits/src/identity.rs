//! Identity Provider Abstraction
//!
//! Models the browser identity library (Google Identity Services) that issues
//! OAuth access tokens. The host owns script loading and the consent popup;
//! the core only decides *when* to ask and in which consent mode.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// How the identity provider may interact with the user when issuing a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentMode {
    /// Show the consent prompt. Only valid from a genuine user gesture, since
    /// browsers block popups opened outside one.
    Interactive,
    /// Never show UI. Succeeds only if the user consented earlier.
    Silent,
}

impl ConsentMode {
    /// Value of the provider's `prompt` parameter for this mode
    pub fn prompt(&self) -> &'static str {
        match self {
            ConsentMode::Interactive => "consent",
            ConsentMode::Silent => "none",
        }
    }
}

/// Parameters used to construct a token client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClientConfig {
    /// OAuth client id (web application type)
    pub client_id: String,
    /// Requested OAuth scope
    pub scope: String,
}

/// Outcome of one token request.
///
/// `Denied` mirrors a success callback carrying an `error` field; `Failed`
/// mirrors the provider's error callback (popup closed, popup blocked, ...).
#[derive(Clone, PartialEq, Eq)]
pub enum TokenResponse {
    Granted {
        access_token: String,
        expires_in: Option<u64>,
    },
    Denied {
        error: String,
    },
    Failed {
        kind: String,
        message: Option<String>,
    },
}

impl TokenResponse {
    pub fn is_granted(&self) -> bool {
        matches!(self, TokenResponse::Granted { .. })
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenResponse::Granted { expires_in, .. } => f
                .debug_struct("Granted")
                .field("access_token", &"[REDACTED]")
                .field("expires_in", expires_in)
                .finish(),
            TokenResponse::Denied { error } => {
                f.debug_struct("Denied").field("error", error).finish()
            }
            TokenResponse::Failed { kind, message } => f
                .debug_struct("Failed")
                .field("kind", kind)
                .field("message", message)
                .finish(),
        }
    }
}

/// A constructed token client.
#[async_trait]
pub trait TokenClient: Send + Sync {
    /// Request an access token.
    ///
    /// Resolves once the provider invokes either its success or its error
    /// callback. Hosts with callback-only APIs can use
    /// `core_auth::consent::consent_channel` to build this future.
    async fn request_access_token(&self, mode: ConsentMode) -> TokenResponse;
}

/// The identity provider library as seen from the page.
#[async_trait]
pub trait IdentityLibrary: Send + Sync {
    /// Whether the page declares the library with a static script tag
    fn has_static_tag(&self) -> bool;

    /// Whether the library's OAuth namespace is loaded and usable
    fn is_available(&self) -> bool;

    /// Inject the library script dynamically and wait for its load event.
    ///
    /// # Errors
    ///
    /// Returns error if the script is blocked (network, CSP) or fails to load.
    async fn inject(&self) -> Result<()>;

    /// Construct a token client for the given configuration
    fn create_token_client(&self, config: TokenClientConfig) -> Result<Arc<dyn TokenClient>>;
}
