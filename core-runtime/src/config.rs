//! # Drive Configuration
//!
//! Settings shared by the token manager and the Drive provider.
//!
//! ## Overview
//!
//! [`DriveConfig`] is built with [`DriveConfigBuilder`] and validated before
//! it is handed out. Every field except the OAuth client id has a default
//! matching the production Google endpoints, so a typical host only supplies
//! the client id and the page origin.
//!
//! Whether a client id is present, and whether the origin is served over
//! HTTP(S), is deliberately not checked here: those are reported to the user
//! by the token manager when it initializes, so a misconfigured page still
//! starts and shows a status.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::DriveConfig;
//!
//! let config = DriveConfig::builder()
//!     .client_id("1234.apps.googleusercontent.com")
//!     .origin("https://ledger.example.com")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.folder_name, "Accountable");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::DriveConfig;
//! use std::time::Duration;
//!
//! // Poll interval longer than the timeout is rejected
//! DriveConfig::builder()
//!     .identity_poll_interval(Duration::from_secs(10))
//!     .build()
//!     .expect("Should fail - poll interval exceeds load timeout");
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
pub const DEFAULT_FOLDER_NAME: &str = "Accountable";
pub const DEFAULT_DOCUMENT_MARKER: &str = ".json";
pub const DEFAULT_DOCUMENT_NAME: &str = "data.json";
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Environment variable holding the OAuth client id.
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
/// Environment variable overriding the application folder name.
pub const ENV_FOLDER_NAME: &str = "ACCOUNTABLE_DRIVE_FOLDER";
/// Environment variable holding the origin the page is served from.
pub const ENV_ORIGIN: &str = "ACCOUNTABLE_PAGE_ORIGIN";

/// Validated Drive integration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    /// OAuth client id. May be empty; the token manager reports it.
    pub client_id: String,

    /// OAuth scope requested from the identity provider
    pub scope: String,

    /// Name of the Drive folder holding the documents
    pub folder_name: String,

    /// Substring a filename must contain to be listed
    pub document_marker: String,

    /// Filename used when a save has no name and by auto-load
    pub default_document: String,

    /// Base URL for metadata requests
    pub drive_api_base: String,

    /// Base URL for content uploads
    pub upload_api_base: String,

    /// How long to wait for the identity library before injecting it
    pub identity_load_timeout: Duration,

    /// Interval between identity library availability checks
    pub identity_poll_interval: Duration,

    /// Origin of the hosting page, when known
    pub origin: Option<String>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            scope: DEFAULT_SCOPE.to_string(),
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            document_marker: DEFAULT_DOCUMENT_MARKER.to_string(),
            default_document: DEFAULT_DOCUMENT_NAME.to_string(),
            drive_api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            upload_api_base: DEFAULT_UPLOAD_API_BASE.to_string(),
            identity_load_timeout: Duration::from_secs(5),
            identity_poll_interval: Duration::from_millis(100),
            origin: None,
        }
    }
}

impl DriveConfig {
    /// Creates a new builder seeded with the defaults.
    pub fn builder() -> DriveConfigBuilder {
        DriveConfigBuilder::default()
    }

    /// Builds a configuration from the process environment.
    ///
    /// Reads [`ENV_CLIENT_ID`], [`ENV_FOLDER_NAME`] and [`ENV_ORIGIN`]; unset
    /// or blank variables leave the default in place.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut builder = Self::builder();
        if let Some(client_id) = read(ENV_CLIENT_ID) {
            builder = builder.client_id(client_id);
        }
        if let Some(folder) = read(ENV_FOLDER_NAME) {
            builder = builder.folder_name(folder);
        }
        if let Some(origin) = read(ENV_ORIGIN) {
            builder = builder.origin(origin);
        }
        builder.build()
    }

    /// Whether the page origin is a local file, where OAuth cannot work.
    pub fn is_file_origin(&self) -> bool {
        self.origin
            .as_deref()
            .map(|origin| origin.starts_with("file:"))
            .unwrap_or(false)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - API base URLs are absolute HTTP(S) URLs
    /// - Folder name, document marker and default document are not blank
    /// - The default document name contains the document marker
    /// - The identity poll interval is non-zero and within the load timeout
    pub fn validate(&self) -> Result<()> {
        for (label, url) in [
            ("Drive API base", &self.drive_api_base),
            ("Upload API base", &self.upload_api_base),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    label, url
                )));
            }
            if url.ends_with('/') {
                return Err(Error::Config(format!(
                    "{} must not end with '/', got '{}'",
                    label, url
                )));
            }
        }

        if self.folder_name.trim().is_empty() {
            return Err(Error::Config("Folder name cannot be empty".to_string()));
        }

        if self.document_marker.is_empty() {
            return Err(Error::Config("Document marker cannot be empty".to_string()));
        }

        if self.default_document.trim().is_empty() {
            return Err(Error::Config(
                "Default document name cannot be empty".to_string(),
            ));
        }

        if !self.default_document.contains(&self.document_marker) {
            return Err(Error::Config(format!(
                "Default document '{}' must contain the document marker '{}'",
                self.default_document, self.document_marker
            )));
        }

        if self.scope.trim().is_empty() {
            return Err(Error::Config("OAuth scope cannot be empty".to_string()));
        }

        if self.identity_poll_interval.is_zero() || self.identity_load_timeout.is_zero() {
            return Err(Error::Config(
                "Identity poll interval and load timeout must be greater than 0".to_string(),
            ));
        }

        if self.identity_poll_interval > self.identity_load_timeout {
            return Err(Error::Config(format!(
                "Identity poll interval ({:?}) exceeds load timeout ({:?})",
                self.identity_poll_interval, self.identity_load_timeout
            )));
        }

        Ok(())
    }
}

/// Builder for [`DriveConfig`].
#[derive(Debug, Default)]
pub struct DriveConfigBuilder {
    config: DriveConfig,
}

impl DriveConfigBuilder {
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.config.scope = scope.into();
        self
    }

    pub fn folder_name(mut self, name: impl Into<String>) -> Self {
        self.config.folder_name = name.into();
        self
    }

    pub fn document_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.document_marker = marker.into();
        self
    }

    pub fn default_document(mut self, name: impl Into<String>) -> Self {
        self.config.default_document = name.into();
        self
    }

    /// Override the metadata endpoint (tests point this at a fake server)
    pub fn drive_api_base(mut self, url: impl Into<String>) -> Self {
        self.config.drive_api_base = url.into();
        self
    }

    pub fn upload_api_base(mut self, url: impl Into<String>) -> Self {
        self.config.upload_api_base = url.into();
        self
    }

    pub fn identity_load_timeout(mut self, timeout: Duration) -> Self {
        self.config.identity_load_timeout = timeout;
        self
    }

    pub fn identity_poll_interval(mut self, interval: Duration) -> Self {
        self.config.identity_poll_interval = interval;
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.origin = Some(origin.into());
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn build(self) -> Result<DriveConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
