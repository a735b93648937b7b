//! # Host Bridge Traits
//!
//! Contracts between the Drive sync core and the host page or application.
//!
//! ## Overview
//!
//! The core never touches the network, the identity provider or the UI
//! directly. Each capability it needs is expressed as a trait here and
//! implemented by the host (a browser shell, a desktop adapter, or a test fake).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations, one attempt per call
//!
//! ### Identity
//! - [`IdentityLibrary`](identity::IdentityLibrary) - Loads the identity provider library
//!   and builds token clients
//! - [`TokenClient`](identity::TokenClient) - Requests OAuth access tokens in
//!   interactive or silent consent mode
//!
//! ### Host Hooks
//! - [`NotificationSink`](host::NotificationSink) - One-line, severity-tagged user messages
//! - [`DocumentStore`](host::DocumentStore) - The in-memory JSON document
//! - [`WorkspaceView`](host::WorkspaceView) - UI refresh, "saved" marker, filename display
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! through `Arc` across async tasks.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod host;
pub mod http;
pub mod identity;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use host::{DocumentStore, NotificationSink, Severity, WorkspaceView};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use identity::{ConsentMode, IdentityLibrary, TokenClient, TokenClientConfig, TokenResponse};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
