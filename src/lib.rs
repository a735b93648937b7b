//! Workspace entry crate.
//!
//! Host applications depend on `accountable-drive` and get the Drive sync
//! façade plus the desktop bridge adapters without wiring each crate
//! individually. Disable `desktop-shims` to bring your own bridges.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{InMemoryDocumentStore, ReqwestHttpClient, TracingNotificationSink};
pub use core_sync::{
    AutoLoadAgent, AutoLoadOutcome, DriveService, HostServices, SaveConflictResolver,
    SaveOutcome, SyncError,
};
