//! Error types for the Google Drive provider

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Drive answered 401; the shared token has been discarded
    #[error("Drive session expired — please reconnect.")]
    SessionExpired,

    /// No token is cached for this session
    #[error("Not connected to Google Drive")]
    NotAuthenticated,

    /// Non-2xx response without a Drive error object
    #[error("{operation} failed: {status}")]
    TransferFailed { operation: String, status: u16 },

    /// Response body carried a Drive error object
    #[error("{message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse Drive response: {0}")]
    ParseError(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl GoogleDriveError {
    /// Whether the user has to authenticate again before retrying
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            GoogleDriveError::SessionExpired | GoogleDriveError::NotAuthenticated
        )
    }
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;
