//! Callback to future bridge for token clients.
//!
//! Browser identity libraries report the outcome of a token request through a
//! success callback and a separate error callback. [`consent_channel`] pairs a
//! cloneable [`ConsentCallbacks`] handle, meant to be captured by both
//! callbacks, with a [`ConsentReceiver`] the `TokenClient` implementation awaits.
//!
//! ```
//! use bridge_traits::TokenResponse;
//! use core_auth::consent_channel;
//!
//! # tokio_test_block_on(async {
//! let (callbacks, receiver) = consent_channel();
//! let on_error = callbacks.clone();
//!
//! callbacks.granted("ya29.token", Some(3599));
//! on_error.failed("popup_closed", None); // ignored, first outcome wins
//!
//! assert!(receiver.wait().await.is_granted());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::sync::{Arc, Mutex};

use bridge_traits::TokenResponse;
use tokio::sync::oneshot;

/// Failure kind reported when every callback handle was dropped unused.
pub const CALLBACK_DROPPED: &str = "callback_dropped";

/// Create a connected callback handle and receiver.
pub fn consent_channel() -> (ConsentCallbacks, ConsentReceiver) {
    let (sender, receiver) = oneshot::channel();
    (
        ConsentCallbacks {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        ConsentReceiver { receiver },
    )
}

/// Completes a pending token request. Only the first completion counts.
#[derive(Clone)]
pub struct ConsentCallbacks {
    sender: Arc<Mutex<Option<oneshot::Sender<TokenResponse>>>>,
}

impl ConsentCallbacks {
    /// Deliver `response`. Returns `false` if the request was already completed.
    pub fn complete(&self, response: TokenResponse) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match sender {
            Some(sender) => sender.send(response).is_ok(),
            None => false,
        }
    }

    /// Success callback carrying a token
    pub fn granted(&self, access_token: impl Into<String>, expires_in: Option<u64>) -> bool {
        self.complete(TokenResponse::Granted {
            access_token: access_token.into(),
            expires_in,
        })
    }

    /// Success callback carrying an `error` field
    pub fn denied(&self, error: impl Into<String>) -> bool {
        self.complete(TokenResponse::Denied {
            error: error.into(),
        })
    }

    /// Error callback (popup closed, popup blocked, ...)
    pub fn failed(&self, kind: impl Into<String>, message: Option<String>) -> bool {
        self.complete(TokenResponse::Failed {
            kind: kind.into(),
            message,
        })
    }
}

/// Awaitable side of [`consent_channel`].
pub struct ConsentReceiver {
    receiver: oneshot::Receiver<TokenResponse>,
}

impl ConsentReceiver {
    /// Wait for the first completion.
    ///
    /// If every [`ConsentCallbacks`] handle is dropped without completing, the
    /// request resolves as `Failed` with kind [`CALLBACK_DROPPED`].
    pub async fn wait(self) -> TokenResponse {
        self.receiver
            .await
            .unwrap_or_else(|_| TokenResponse::Failed {
                kind: CALLBACK_DROPPED.to_string(),
                message: None,
            })
    }
}
