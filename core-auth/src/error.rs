use thiserror::Error;

use crate::types::{SessionEvent, TokenStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Google OAuth does not work from {origin}; serve the page over http:// or https://")]
    UnsupportedOrigin { origin: String },

    #[error("Google Identity Services unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("Token client initialization failed: {0}")]
    Initialization(String),

    #[error("Google Drive is not ready yet")]
    NotReady,

    #[error("Consent denied: {0}")]
    ConsentDenied(String),

    #[error("Consent failed: {0}")]
    ConsentFailed(String),

    #[error("Consent prompt was abandoned before it completed")]
    ConsentAbandoned,

    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("Invalid token status transition from {from} on {event}")]
    InvalidTransition {
        from: TokenStatus,
        event: SessionEvent,
    },
}

pub type Result<T> = std::result::Result<T, AuthError>;
