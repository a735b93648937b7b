//! # Drive Service
//!
//! Entry points the host wires to page startup and user gestures.
//!
//! ## Overview
//!
//! `DriveService` owns the token manager and the Drive components and
//! composes them into the four user flows:
//!
//! - [`startup`](DriveService::startup): initialize the token client, then
//!   attempt the silent auto-load
//! - [`open_from_remote`](DriveService::open_from_remote): list the documents
//!   in the application folder
//! - [`open_file`](DriveService::open_file): load one listed document
//! - [`save_to_remote`](DriveService::save_to_remote): save the current
//!   document, optionally backing up a same-named file
//!
//! The gesture handlers authenticate through `TokenManager::with_auth`, so the
//! consent prompt opens from the user's click when no token is cached.
//!
//! ## Notifications
//!
//! Each user-triggered failure produces one error notification and one log
//! line. Authentication failures are notified by the token manager and not
//! repeated here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{DriveService, HostServices};
//!
//! let service = DriveService::new(config, host, EventBus::default());
//! service.startup().await;
//!
//! // Save dialog confirmed:
//! service.save_to_remote("  ", true).await?; // saved as data.json
//! ```

use bridge_traits::{
    Clock, DocumentStore, HttpClient, IdentityLibrary, NotificationSink, WorkspaceView,
};
use core_auth::TokenManager;
use core_runtime::config::DriveConfig;
use core_runtime::events::{CoreEvent, DriveEvent, EventBus};
use provider_google_drive::{FileMetadata, GoogleDrive};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::auto_load::{AutoLoadAgent, AutoLoadOutcome};
use crate::document::{install_document, parse_document, render_document};
use crate::error::{Result, SyncError};
use crate::save::{rename_preview, SaveConflictResolver, SaveOutcome};

/// Host capabilities the service runs on.
#[derive(Clone)]
pub struct HostServices {
    pub identity: Arc<dyn IdentityLibrary>,
    pub http_client: Arc<dyn HttpClient>,
    pub notifier: Arc<dyn NotificationSink>,
    pub document: Arc<dyn DocumentStore>,
    pub view: Arc<dyn WorkspaceView>,
    pub clock: Arc<dyn Clock>,
}

pub struct DriveService {
    config: DriveConfig,
    tokens: Arc<TokenManager>,
    drive: GoogleDrive,
    saver: SaveConflictResolver,
    auto_load: AutoLoadAgent,
    document: Arc<dyn DocumentStore>,
    view: Arc<dyn WorkspaceView>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl DriveService {
    pub fn new(config: DriveConfig, host: HostServices, event_bus: EventBus) -> Self {
        let tokens = Arc::new(TokenManager::new(
            config.clone(),
            host.identity,
            host.notifier.clone(),
            event_bus,
        ));
        let drive = GoogleDrive::new(host.http_client, tokens.clone(), &config);
        let auto_load = AutoLoadAgent::new(
            tokens.clone(),
            drive.clone(),
            host.document.clone(),
            host.view.clone(),
            host.notifier.clone(),
            config.default_document.clone(),
        );

        Self {
            saver: SaveConflictResolver::new(drive.clone()),
            config,
            tokens,
            drive,
            auto_load,
            document: host.document,
            view: host.view,
            notifier: host.notifier,
            clock: host.clock,
        }
    }

    /// Page startup: initialize the token client, then try the silent auto-load.
    ///
    /// Initialization failures are logged and leave the service usable for a
    /// later attempt; the status indicator already reflects them.
    #[instrument(skip(self))]
    pub async fn startup(&self) -> AutoLoadOutcome {
        if let Err(err) = self.tokens.initialize().await {
            warn!(error = %err, "Drive initialization failed");
            return AutoLoadOutcome::NotAuthorized;
        }
        self.auto_load.run().await
    }

    /// Documents in the application folder, newest first.
    #[instrument(skip(self))]
    pub async fn open_from_remote(&self) -> Result<Vec<FileMetadata>> {
        let catalog = self.drive.catalog.clone();
        let result = self
            .tokens
            .with_auth(|_| async move { catalog.list_files().await.map_err(SyncError::from) })
            .await;

        if let Err(err) = &result {
            warn!(error = %err, "Listing Drive documents failed");
            if !err.already_reported() {
                self.notifier.error(&format!("Error: {}", err));
            }
        }
        result
    }

    /// Replace the in-memory document with Drive file `id`.
    ///
    /// On failure the in-memory document is left untouched.
    #[instrument(skip(self))]
    pub async fn open_file(&self, id: &str, name: &str) -> Result<()> {
        let transfer = self.drive.transfer.clone();
        let loaded = self
            .tokens
            .with_auth(|_| async move {
                let content = transfer.download(id).await?;
                parse_document(&content)
            })
            .await;

        match loaded {
            Ok(document) => {
                install_document(self.document.as_ref(), self.view.as_ref(), document, name);
                self.notifier
                    .info(&format!("Loaded {} from Google Drive", name));
                info!(file_id = %id, "Opened document");
                self.emit(DriveEvent::DocumentLoaded {
                    file_name: name.to_string(),
                    file_id: id.to_string(),
                    automatic: false,
                });
                Ok(())
            }
            Err(err) => {
                error!(error = %err, file_id = %id, "Loading document failed");
                if !err.already_reported() {
                    self.notifier
                        .error(&format!("Error loading file: {}", err));
                }
                Err(err)
            }
        }
    }

    /// Save the current document to Drive as `name`.
    ///
    /// `name` is trimmed; a blank name saves under the default document name.
    #[instrument(skip(self))]
    pub async fn save_to_remote(&self, name: &str, rename_existing: bool) -> Result<SaveOutcome> {
        let name = self.save_name(name);
        let result = self
            .tokens
            .with_auth(|_| async {
                let content = render_document(&self.document.snapshot())?;
                self.saver.save(&name, &content, rename_existing).await
            })
            .await;

        match result {
            Ok(outcome) => {
                if let Some(backup) = outcome.backup_name() {
                    self.notifier
                        .info(&format!("Renamed old file to {}", backup));
                }
                self.document.set_file_name(&name);
                self.view.show_file_name(&name);
                self.view.mark_saved();
                self.notifier
                    .info(&format!("Saved {} to Google Drive ✓", name));
                self.emit(DriveEvent::DocumentSaved {
                    file_name: name.clone(),
                    file_id: outcome.file_id().to_string(),
                    backup_name: outcome.backup_name().map(str::to_string),
                });
                Ok(outcome)
            }
            Err(err) => {
                error!(error = %err, file = %name, "Drive save failed");
                if !err.already_reported() {
                    self.notifier
                        .error(&format!("Error saving to Drive: {}", err));
                }
                Err(err)
            }
        }
    }

    /// The save dialog's preview line for `name`, dated today.
    pub fn rename_preview(&self, name: &str, rename_existing: bool) -> String {
        rename_preview(&self.save_name(name), rename_existing, self.clock.today())
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn drive(&self) -> &GoogleDrive {
        &self.drive
    }

    pub fn event_bus(&self) -> &EventBus {
        self.tokens.event_bus()
    }

    fn save_name(&self, name: &str) -> String {
        match name.trim() {
            "" => self.config.default_document.clone(),
            trimmed => trimmed.to_string(),
        }
    }

    fn emit(&self, event: DriveEvent) {
        let _ = self.event_bus().emit(CoreEvent::Drive(event));
    }
}
