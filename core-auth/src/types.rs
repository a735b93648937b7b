use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, Result};

/// OAuth access token for the Drive REST API.
///
/// # Security
///
/// Tokens must never be logged. The `Debug` and `Display` implementations
/// redact the secret; use [`AccessToken::secret`] only to build the
/// `Authorization` header.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
///
/// let token = AccessToken::new("ya29.a0...");
/// assert_eq!(format!("{:?}", token), "AccessToken([REDACTED])");
/// assert_eq!(token.secret(), "ya29.a0...");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw bearer value
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Lifecycle status of the session's access token.
///
/// # State Transitions
///
/// ```text
/// Uninitialized -> Initializing -> Ready ----> Authenticated
///       ^               |           |            ^   |
///       +---------------+           v            |   v (401)
///         (init failed)           Failed ------->+ Expired
/// ```
///
/// `Expired` and `Failed` behave like `Ready`: the next protected call has to
/// ask for consent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TokenStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Authenticated,
    Expired,
    Failed,
}

/// Input to [`TokenStatus::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// `initialize()` began loading the identity library
    InitStarted,
    /// The token client was constructed
    InitSucceeded,
    /// Preflight, library loading or client construction failed
    InitFailed,
    /// The identity provider granted an access token
    TokenGranted,
    /// An interactive consent attempt was denied or errored
    ConsentFailed,
    /// A Drive request came back 401
    Unauthorized,
}

impl TokenStatus {
    /// Pure transition function.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidTransition`] for events that make no sense
    /// in the current status, such as a granted token before initialization.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::{SessionEvent, TokenStatus};
    ///
    /// let status = TokenStatus::Authenticated.apply(SessionEvent::Unauthorized).unwrap();
    /// assert_eq!(status, TokenStatus::Expired);
    /// assert!(TokenStatus::Uninitialized.apply(SessionEvent::TokenGranted).is_err());
    /// ```
    pub fn apply(self, event: SessionEvent) -> Result<TokenStatus> {
        use SessionEvent::*;
        use TokenStatus::*;

        let next = match (self, event) {
            (Uninitialized, InitStarted) => Initializing,
            (Initializing, InitSucceeded) => Ready,
            (Initializing, InitFailed) => Uninitialized,

            (Ready | Expired | Failed | Authenticated, TokenGranted) => Authenticated,
            (Ready | Expired | Failed, ConsentFailed) => Failed,

            (Authenticated, Unauthorized) => Expired,
            (status, Unauthorized) => status,

            (from, event) => return Err(AuthError::InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Whether the identity library is loaded and a token client exists.
    pub fn is_initialized(&self) -> bool {
        !matches!(self, TokenStatus::Uninitialized | TokenStatus::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, TokenStatus::Authenticated)
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TokenStatus::Uninitialized => "Uninitialized",
            TokenStatus::Initializing => "Initializing",
            TokenStatus::Ready => "Ready",
            TokenStatus::Authenticated => "Authenticated",
            TokenStatus::Expired => "Expired",
            TokenStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
