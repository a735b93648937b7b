use core_auth::AuthError;
use provider_google_drive::GoogleDriveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Drive(#[from] GoogleDriveError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Downloaded content is not a JSON document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Failed to serialize document: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Whether the token manager already told the user about this failure.
    pub fn already_reported(&self) -> bool {
        match self {
            SyncError::Auth(err) | SyncError::Drive(GoogleDriveError::Auth(err)) => {
                !matches!(err, AuthError::ConsentAbandoned)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
