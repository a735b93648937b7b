//! # Authentication Module
//!
//! Access-token lifecycle for the Google Drive integration.
//!
//! ## Overview
//!
//! Tokens come from a browser identity provider (Google Identity Services)
//! reached through [`bridge_traits::IdentityLibrary`]. This crate decides when
//! to ask for one, caches it for the page session and discards it as soon as
//! Drive answers 401.
//!
//! ## Features
//!
//! - One-time identity library loading with dynamic injection fallback
//! - Interactive consent from user gestures, silent consent at startup
//! - FIFO queue of callers waiting on an in-flight consent prompt
//! - Pure status transition function ([`TokenStatus::apply`])
//! - Status indicator updates published on the event bus

pub mod consent;
pub mod error;
pub mod manager;
pub mod session;
pub mod types;

pub use consent::{consent_channel, ConsentCallbacks, ConsentReceiver};
pub use error::{AuthError, Result};
pub use manager::TokenManager;
pub use types::{AccessToken, SessionEvent, TokenStatus};
