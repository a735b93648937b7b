//! # Google Drive Provider
//!
//! Drive v3 REST access for the application folder.
//!
//! ## Overview
//!
//! This module provides:
//! - [`DriveConnector`]: bearer-token requests and the shared response policy
//!   (401 discards the session token)
//! - [`FolderResolver`]: finds or creates the application folder, once per session
//! - [`FileCatalog`]: lists the JSON documents in the folder, newest first
//! - [`ContentTransfer`]: download, media and multipart upload, rename
//!
//! [`GoogleDrive`] wires the four together from one HTTP client and token
//! manager.
//!
//! Requests never trigger a consent prompt. Callers obtain a token through
//! `TokenManager::with_auth` first; without one, requests fail with
//! [`GoogleDriveError::NotAuthenticated`].

pub mod catalog;
pub mod connector;
pub mod error;
pub mod folder;
pub mod multipart;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod test_support;

pub use catalog::FileCatalog;
pub use connector::DriveConnector;
pub use error::{GoogleDriveError, Result};
pub use folder::FolderResolver;
pub use multipart::{MultipartBody, MultipartRelated};
pub use transfer::ContentTransfer;
pub use types::{DriveFile, FileMetadata};

use bridge_traits::http::HttpClient;
use core_auth::TokenManager;
use core_runtime::config::DriveConfig;
use std::sync::Arc;

/// The Drive components sharing one connector and folder cache.
#[derive(Clone)]
pub struct GoogleDrive {
    pub connector: Arc<DriveConnector>,
    pub folders: Arc<FolderResolver>,
    pub catalog: Arc<FileCatalog>,
    pub transfer: Arc<ContentTransfer>,
}

impl GoogleDrive {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<TokenManager>,
        config: &DriveConfig,
    ) -> Self {
        let connector = Arc::new(DriveConnector::new(http_client, tokens, config));
        let folders = Arc::new(FolderResolver::new(
            connector.clone(),
            config.folder_name.clone(),
        ));
        let catalog = Arc::new(FileCatalog::new(
            connector.clone(),
            folders.clone(),
            config.document_marker.clone(),
        ));
        let transfer = Arc::new(ContentTransfer::new(connector.clone(), folders.clone()));

        Self {
            connector,
            folders,
            catalog,
            transfer,
        }
    }
}
