//! # Desktop Bridge Implementations
//!
//! Native implementations of the host bridge traits.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (one attempt per request)
//! - `NotificationSink` writing user messages through `tracing`
//! - `DocumentStore` and `WorkspaceView` backed by an in-memory JSON value
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{InMemoryDocumentStore, ReqwestHttpClient, TracingNotificationSink};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let notifier = Arc::new(TracingNotificationSink::default());
//! let document = Arc::new(InMemoryDocumentStore::default());
//! ```

mod document;
mod http;
mod notify;

pub use document::InMemoryDocumentStore;
pub use http::ReqwestHttpClient;
pub use notify::TracingNotificationSink;
