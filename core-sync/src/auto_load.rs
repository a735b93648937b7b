//! Startup auto-load of the default document
//!
//! Once the token client is ready, the page tries a silent token. If the user
//! consented in an earlier visit, the default document is fetched from the
//! application folder and replaces the in-memory document.
//!
//! Nothing here is user-facing on failure: a declined silent token, a missing
//! file, a network error or unparseable content are logged and the in-memory
//! document stays as it was.

use bridge_traits::{DocumentStore, NotificationSink, WorkspaceView};
use core_auth::TokenManager;
use core_runtime::events::{CoreEvent, DriveEvent};
use provider_google_drive::GoogleDrive;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::document::{install_document, parse_document};
use crate::error::Result;

/// Result of one auto-load attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoLoadOutcome {
    /// No token could be obtained without user interaction
    NotAuthorized,
    /// The folder has no default document
    NotFound,
    /// The default document replaced the in-memory document
    Loaded { file_id: String },
    /// A Drive or parse error; see the logs
    Failed,
    /// The auto-load already ran in this session
    Skipped,
}

pub struct AutoLoadAgent {
    tokens: Arc<TokenManager>,
    drive: GoogleDrive,
    document: Arc<dyn DocumentStore>,
    view: Arc<dyn WorkspaceView>,
    notifier: Arc<dyn NotificationSink>,
    file_name: String,
    started: AtomicBool,
}

impl AutoLoadAgent {
    pub fn new(
        tokens: Arc<TokenManager>,
        drive: GoogleDrive,
        document: Arc<dyn DocumentStore>,
        view: Arc<dyn WorkspaceView>,
        notifier: Arc<dyn NotificationSink>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            drive,
            document,
            view,
            notifier,
            file_name: file_name.into(),
            started: AtomicBool::new(false),
        }
    }

    /// Try to load the default document without showing any UI.
    ///
    /// Only the first call after the token manager is ready does anything.
    #[instrument(skip(self), fields(file = %self.file_name))]
    pub async fn run(&self) -> AutoLoadOutcome {
        if !self.tokens.status().is_initialized() {
            debug!(status = %self.tokens.status(), "Auto-load skipped, token client not ready");
            return AutoLoadOutcome::NotAuthorized;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Auto-load already ran");
            return AutoLoadOutcome::Skipped;
        }

        if self.tokens.request_silent_token().await.is_none() {
            debug!("No prior consent, auto-load skipped");
            return AutoLoadOutcome::NotAuthorized;
        }

        match self.load().await {
            Ok(Some(file_id)) => AutoLoadOutcome::Loaded { file_id },
            Ok(None) => {
                debug!("No default document on Drive");
                AutoLoadOutcome::NotFound
            }
            Err(err) => {
                warn!(error = %err, "Auto-load failed");
                AutoLoadOutcome::Failed
            }
        }
    }

    async fn load(&self) -> Result<Option<String>> {
        self.drive.folders.ensure_folder().await?;
        let Some(file) = self.drive.catalog.find_by_name(&self.file_name).await? else {
            return Ok(None);
        };

        let content = self.drive.transfer.download(&file.id).await?;
        let document = parse_document(&content)?;

        install_document(
            self.document.as_ref(),
            self.view.as_ref(),
            document,
            &self.file_name,
        );
        self.notifier
            .info(&format!("Auto-loaded {} from Google Drive", self.file_name));
        info!(file_id = %file.id, "Auto-loaded document");
        let _ = self
            .tokens
            .event_bus()
            .emit(CoreEvent::Drive(DriveEvent::DocumentLoaded {
                file_name: self.file_name.clone(),
                file_id: file.id.clone(),
                automatic: true,
            }));

        Ok(Some(file.id))
    }
}
