//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Drive sync core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other crates depend on. It
//! establishes the logging conventions, the validated Drive configuration and
//! the event broadcasting used to drive the host's status indicator.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{DriveConfig, DriveConfigBuilder};
pub use error::{Error, Result};
pub use events::{AuthEvent, CoreEvent, DriveEvent, EventBus};
