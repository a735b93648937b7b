//! # Event Bus System
//!
//! Broadcasts typed events from the core to the host using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The core never draws UI. Anything the page may want to reflect (the Drive
//! status badge, a freshly saved document) is published here and the host
//! subscribes:
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ TokenManager ├──────────────>│           │     subscribe    ┌──────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Status badge │
//! ┌──────────────┐     emit      │ (broadcast│                  └──────────────┘
//! │ Drive sync   ├──────────────>│  channel) │
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
//!
//! let event_bus = EventBus::new(16);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Auth(AuthEvent::StatusChanged {
//!         connected: true,
//!         text: "Connected".to_string(),
//!     }))
//!     .ok();
//!
//! assert!(receiver.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! Emitting with no subscribers returns `SendError`; the core ignores it since
//! a page without a status badge is a valid host. Slow subscribers receive
//! `RecvError::Lagged(n)` and may continue.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError, TryRecvError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication-related events
    Auth(AuthEvent),
    /// Drive folder and document events
    Drive(DriveEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Drive(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::SessionExpired) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Drive(DriveEvent::DocumentSaved { .. }) => EventSeverity::Info,
            CoreEvent::Drive(DriveEvent::DocumentLoaded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Events related to the access token lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// The Drive status indicator should change.
    StatusChanged {
        /// Whether the indicator shows the connected style.
        connected: bool,
        /// Short label ("Drive", "Connected", "Session expired", ...).
        text: String,
    },
    /// An access token was granted.
    SignedIn {
        /// Whether the grant came from the silent (no prompt) path.
        silent: bool,
    },
    /// A request observed a 401 and the cached token was discarded.
    SessionExpired,
    /// The consent flow or identity library failed.
    AuthError {
        /// Human-readable error message.
        message: String,
        /// Whether trying again may succeed.
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::StatusChanged { .. } => "Drive status changed",
            AuthEvent::SignedIn { .. } => "Access token granted",
            AuthEvent::SessionExpired => "Drive session expired",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Drive Events
// ============================================================================

/// Events related to the application folder and its documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DriveEvent {
    /// The application folder id is known for this session.
    FolderResolved {
        folder_id: String,
        /// `true` when the folder did not exist and was created.
        created: bool,
    },
    /// A document was written to Drive.
    DocumentSaved {
        file_name: String,
        file_id: String,
        /// Name the previous same-named file was renamed to, if any.
        backup_name: Option<String>,
    },
    /// A document was read from Drive into memory.
    DocumentLoaded {
        file_name: String,
        file_id: String,
        /// `true` for the startup auto-load.
        automatic: bool,
    },
}

impl DriveEvent {
    fn description(&self) -> &str {
        match self {
            DriveEvent::FolderResolved { .. } => "Application folder resolved",
            DriveEvent::DocumentSaved { .. } => "Document saved to Drive",
            DriveEvent::DocumentLoaded { .. } => "Document loaded from Drive",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for core events.
///
/// Cloning an `EventBus` yields another handle onto the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Drain every event currently buffered for `receiver`.
///
/// Lagged notices are skipped; the call stops at the first empty read.
pub fn drain(receiver: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return events,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
