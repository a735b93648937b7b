//! # Drive Sync Module
//!
//! Keeps the host's JSON document in step with Google Drive.
//!
//! ## Overview
//!
//! This module composes the token manager and the Drive provider into the
//! flows the page exposes:
//! - Silent auto-load of the default document at startup
//! - Listing and opening documents from the application folder
//! - Saving with an optional dated backup of a same-named file
//!
//! ## Components
//!
//! - **Save Conflict Resolver** (`save`): create, overwrite or back up and re-create
//! - **Auto-Load Agent** (`auto_load`): one silent attempt per session, log-only failures
//! - **Drive Service** (`service`): startup initializer and gesture handlers
//! - **Document helpers** (`document`): parse and render the stored JSON

pub mod auto_load;
pub mod document;
pub mod error;
pub mod save;
pub mod service;

pub use auto_load::{AutoLoadAgent, AutoLoadOutcome};
pub use error::{Result, SyncError};
pub use save::{backup_name, rename_preview, SaveConflictResolver, SaveOutcome};
pub use service::{DriveService, HostServices};
