//! # Token Manager
//!
//! Owns the access token for the page session.
//!
//! ## Overview
//!
//! The `TokenManager` loads the identity library once, builds a token client
//! and hands tokens to Drive operations. Interactive consent is only opened
//! from a protected call (a user gesture); the startup auto-load uses the
//! silent path instead.
//!
//! While a consent prompt is open, further protected calls queue behind it and
//! are resolved in arrival order when the prompt completes.
//!
//! Every status change is mirrored to the host as
//! `AuthEvent::StatusChanged { connected, text }` on the event bus.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::TokenManager;
//! use core_runtime::{DriveConfig, EventBus};
//! use std::sync::Arc;
//! # use bridge_traits::{IdentityLibrary, NotificationSink};
//! # async fn run(identity: Arc<dyn IdentityLibrary>, notifier: Arc<dyn NotificationSink>) -> core_auth::Result<()> {
//! let config = DriveConfig::builder()
//!     .client_id("1234.apps.googleusercontent.com")
//!     .build()
//!     .expect("valid config");
//!
//! let manager = TokenManager::new(config, identity, notifier, EventBus::default());
//! manager.initialize().await?;
//!
//! // Inside a click handler:
//! let listing = manager
//!     .with_auth(|token| async move {
//!         // call Drive with `token`
//!         Ok::<_, core_auth::AuthError>(token.secret().len())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use bridge_traits::{
    ConsentMode, IdentityLibrary, NotificationSink, TokenClient, TokenClientConfig, TokenResponse,
};
use core_runtime::config::DriveConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use core_runtime::logging::redact_if_sensitive;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::session::{resolve_all, Admission, PromptGuard, SessionStore};
use crate::types::{AccessToken, SessionEvent, TokenStatus};

/// Shown when a protected call arrives before the token client exists.
pub const NOT_READY_MESSAGE: &str =
    "Google Drive not ready yet — please wait a moment and try again.";

/// Shown when the identity library cannot be loaded.
pub const LIBRARY_LOAD_MESSAGE: &str =
    "Could not load Google Identity Services. Check network/CSP.";

/// Status indicator labels.
pub mod status_text {
    pub const READY: &str = "Drive";
    pub const CONNECTED: &str = "Connected";
    pub const EXPIRED: &str = "Session expired";
    pub const AUTH_FAILED: &str = "Auth failed";
    pub const AUTH_ERROR: &str = "Auth error";
    pub const NEEDS_HTTP: &str = "Needs HTTP/HTTPS";
    pub const NO_CLIENT_ID: &str = "No Client ID";
    pub const LOADING_LIBRARY: &str = "Loading GIS…";
    pub const LIBRARY_FAILED: &str = "GIS load failed";
    pub const INIT_FAILED: &str = "Init failed";
}

/// Access-token lifecycle for one page session.
///
/// Shared through `Arc`; every method takes `&self`.
pub struct TokenManager {
    config: DriveConfig,
    identity: Arc<dyn IdentityLibrary>,
    notifier: Arc<dyn NotificationSink>,
    event_bus: EventBus,
    session: SessionStore,
    token_client: RwLock<Option<Arc<dyn TokenClient>>>,
    injected: AtomicBool,
}

impl TokenManager {
    pub fn new(
        config: DriveConfig,
        identity: Arc<dyn IdentityLibrary>,
        notifier: Arc<dyn NotificationSink>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            config,
            identity,
            notifier,
            event_bus,
            session: SessionStore::default(),
            token_client: RwLock::new(None),
            injected: AtomicBool::new(false),
        }
    }

    /// Load the identity library and construct the token client.
    ///
    /// On success the status becomes `Ready` and the indicator shows "Drive".
    /// Calling this again after it started is a no-op.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UnsupportedOrigin`] when the page is opened from `file:`
    /// - [`AuthError::Configuration`] when no client id is configured
    /// - [`AuthError::LibraryUnavailable`] when the library never loads
    /// - [`AuthError::Initialization`] when the token client cannot be built
    ///
    /// Each failure also updates the status indicator, and the status returns
    /// to `Uninitialized`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut state = self.session.lock();
            if state.status != TokenStatus::Uninitialized {
                debug!(status = %state.status, "Token manager already initialized");
                return Ok(());
            }
            state.transition(SessionEvent::InitStarted)?;
        }

        match self.prepare_token_client().await {
            Ok(client) => {
                *self
                    .token_client
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(client);
                self.session.transition(SessionEvent::InitSucceeded)?;
                self.set_status(false, status_text::READY);
                info!("Token client ready");
                Ok(())
            }
            Err(err) => {
                self.session.transition(SessionEvent::InitFailed)?;
                Err(err)
            }
        }
    }

    async fn prepare_token_client(&self) -> Result<Arc<dyn TokenClient>> {
        if self.config.is_file_origin() {
            self.set_status(false, status_text::NEEDS_HTTP);
            warn!("Google OAuth does not work over file://. Use http:// or https://");
            return Err(AuthError::UnsupportedOrigin {
                origin: self.config.origin.clone().unwrap_or_default(),
            });
        }

        if self.config.client_id.trim().is_empty() {
            self.set_status(false, status_text::NO_CLIENT_ID);
            warn!("Google client id is not set");
            return Err(AuthError::Configuration(
                "Google client id is not set".to_string(),
            ));
        }

        self.load_identity_library().await?;

        let client_config = TokenClientConfig {
            client_id: self.config.client_id.clone(),
            scope: self.config.scope.clone(),
        };
        debug!(
            client_id = %redact_if_sensitive("client_id", &client_config.client_id),
            scope = %client_config.scope,
            "Creating token client"
        );

        self.identity
            .create_token_client(client_config)
            .map_err(|err| {
                self.set_status(false, status_text::INIT_FAILED);
                error!(error = %err, "Token client construction failed");
                AuthError::Initialization(err.to_string())
            })
    }

    /// Wait for the identity library, injecting it at most once.
    async fn load_identity_library(&self) -> Result<()> {
        if !self.identity.has_static_tag() {
            warn!("Identity library script tag not found, injecting dynamically");
            self.inject_library().await?;
        }

        loop {
            if self.wait_for_library().await {
                return Ok(());
            }

            if self.injected.load(Ordering::SeqCst) {
                return Err(self.library_failed(format!(
                    "not available after {:?}",
                    self.config.identity_load_timeout
                )));
            }

            error!(
                timeout = ?self.config.identity_load_timeout,
                "Identity library failed to load, trying dynamic injection"
            );
            self.set_status(false, status_text::LOADING_LIBRARY);
            self.inject_library().await?;
        }
    }

    async fn inject_library(&self) -> Result<()> {
        self.injected.store(true, Ordering::SeqCst);
        self.identity
            .inject()
            .await
            .map_err(|err| self.library_failed(err.to_string()))
    }

    /// Poll availability until the configured timeout. `true` once available.
    async fn wait_for_library(&self) -> bool {
        let deadline = Instant::now() + self.config.identity_load_timeout;
        loop {
            if self.identity.is_available() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.config.identity_poll_interval).await;
        }
    }

    fn library_failed(&self, reason: String) -> AuthError {
        error!(reason = %reason, "Identity library unavailable");
        self.set_status(false, status_text::LIBRARY_FAILED);
        self.notifier.error(LIBRARY_LOAD_MESSAGE);
        AuthError::LibraryUnavailable(reason)
    }

    /// Get a token for a protected operation.
    ///
    /// Returns the cached token when authenticated. Otherwise the call joins
    /// the waiter queue; the first queued caller opens the interactive
    /// consent prompt and every queued caller receives its outcome.
    ///
    /// Must be driven from a user gesture: browsers block consent popups
    /// opened anywhere else.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotReady`] before `initialize()` completed (the user is notified)
    /// - [`AuthError::ConsentDenied`] / [`AuthError::ConsentFailed`] when consent fails
    /// - [`AuthError::ConsentAbandoned`] if the prompt's driver was dropped
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<AccessToken> {
        let (receiver, start_prompt) = match self.session.enqueue() {
            Admission::Cached(token) => return Ok(token),
            Admission::NotReady => {
                warn!(status = %self.status(), "Protected call before token client is ready");
                self.notifier.error(NOT_READY_MESSAGE);
                return Err(AuthError::NotReady);
            }
            Admission::Queued {
                receiver,
                start_prompt,
            } => (receiver, start_prompt),
        };

        if start_prompt {
            self.run_interactive_prompt().await;
        } else {
            debug!("Consent prompt already open, queued behind it");
        }

        receiver.await.unwrap_or(Err(AuthError::ConsentAbandoned))
    }

    /// Run `action` with a valid token, obtaining one first if needed.
    ///
    /// The action runs exactly once, after authentication succeeds; it is not
    /// run at all if authentication fails.
    pub async fn with_auth<F, Fut, T, E>(&self, action: F) -> std::result::Result<T, E>
    where
        F: FnOnce(AccessToken) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<AuthError>,
    {
        let token = self.access_token().await?;
        action(token).await
    }

    async fn run_interactive_prompt(&self) {
        let guard = PromptGuard::new(&self.session);

        let Some(client) = self.token_client() else {
            guard.disarm();
            resolve_all(self.session.abandon_prompt(), Err(AuthError::NotReady));
            return;
        };

        info!("Requesting interactive consent");
        let response = client.request_access_token(ConsentMode::Interactive).await;
        guard.disarm();

        match response {
            TokenResponse::Granted { access_token, .. } => {
                self.accept_token(AccessToken::new(access_token), ConsentMode::Interactive);
            }
            TokenResponse::Denied { error } => {
                error!(error = %error, "Consent denied");
                self.reject_consent(
                    status_text::AUTH_FAILED,
                    format!("Google Drive: {}", error),
                    AuthError::ConsentDenied(error),
                );
            }
            TokenResponse::Failed { kind, message } => {
                let detail = message.unwrap_or(kind);
                error!(error = %detail, "Token client error");
                self.reject_consent(
                    status_text::AUTH_ERROR,
                    format!("Google Drive auth error: {}", detail),
                    AuthError::ConsentFailed(detail),
                );
            }
        }
    }

    /// Try to obtain a token without showing any UI.
    ///
    /// Success behaves like interactive success. Failure of any kind is
    /// expected (no prior consent) and only logged at debug level: no status
    /// change, no notification.
    #[instrument(skip(self))]
    pub async fn request_silent_token(&self) -> Option<AccessToken> {
        if !self.status().is_initialized() {
            debug!("Silent token skipped, token client not ready");
            return None;
        }

        let client = self.token_client()?;

        match client.request_access_token(ConsentMode::Silent).await {
            TokenResponse::Granted { access_token, .. } => {
                let token = AccessToken::new(access_token);
                self.accept_token(token.clone(), ConsentMode::Silent)
                    .then_some(token)
            }
            other => {
                debug!(response = ?other, "Silent token request declined");
                None
            }
        }
    }

    /// Store a granted token and release the queue. `false` if rejected.
    fn accept_token(&self, token: AccessToken, mode: ConsentMode) -> bool {
        let ends_prompt = mode == ConsentMode::Interactive;
        let waiters = match self.session.grant(token.clone(), ends_prompt) {
            Ok(waiters) => waiters,
            Err(err) => {
                warn!(error = %err, "Discarding granted token");
                return false;
            }
        };

        info!(queued = waiters.len(), silent = !ends_prompt, "Access token granted");
        self.set_status(true, status_text::CONNECTED);
        self.emit(AuthEvent::SignedIn { silent: !ends_prompt });
        resolve_all(waiters, Ok(token));
        true
    }

    fn reject_consent(&self, status: &str, message: String, err: AuthError) {
        let (applied, waiters) = self.session.fail_consent();
        if !applied {
            // A silent grant landed while the prompt was open; keep that session.
            match self.session.token() {
                Some(token) => resolve_all(waiters, Ok(token)),
                None => resolve_all(waiters, Err(err)),
            }
            return;
        }

        self.set_status(false, status);
        self.notifier.error(&message);
        self.emit(AuthEvent::AuthError {
            message,
            recoverable: true,
        });
        resolve_all(waiters, Err(err));
    }

    /// Discard the cached token after a 401.
    ///
    /// The status moves to `Expired` and the indicator shows "Session expired".
    /// The token is cleared whatever the current status.
    #[instrument(skip(self))]
    pub fn invalidate(&self) {
        let had_token = self.session.invalidate();
        warn!(had_token, "Access token rejected by Drive, session expired");
        self.set_status(false, status_text::EXPIRED);
        self.emit(AuthEvent::SessionExpired);
    }

    pub fn status(&self) -> TokenStatus {
        self.session.status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// The cached token, without triggering consent
    pub fn current_token(&self) -> Option<AccessToken> {
        self.session.token()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    fn token_client(&self) -> Option<Arc<dyn TokenClient>> {
        self.token_client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_status(&self, connected: bool, text: &str) {
        debug!(connected, text, "Drive status");
        self.emit(AuthEvent::StatusChanged {
            connected,
            text: text.to_string(),
        });
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.event_bus.emit(CoreEvent::Auth(event));
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("status", &self.status())
            .field("folder_name", &self.config.folder_name)
            .finish()
    }
}
