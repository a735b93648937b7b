//! Session state store.
//!
//! Holds the token, its status and the queue of callers waiting on a consent
//! prompt. The lock is a plain `std::sync::Mutex`: every method finishes its
//! work synchronously, so the guard never lives across an `.await`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::types::{AccessToken, SessionEvent, TokenStatus};

/// Resolves one caller of `TokenManager::access_token` exactly once.
pub(crate) type Waiter = oneshot::Sender<Result<AccessToken>>;

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub status: TokenStatus,
    pub token: Option<AccessToken>,
    pub waiters: VecDeque<Waiter>,
    pub prompt_in_flight: bool,
}

impl SessionState {
    /// Apply `event` through [`TokenStatus::apply`] and store the result.
    pub fn transition(&mut self, event: SessionEvent) -> Result<TokenStatus> {
        self.status = self.status.apply(event)?;
        Ok(self.status)
    }
}

/// What a caller of [`SessionStore::enqueue`] has to do next.
pub(crate) enum Admission {
    /// A token is cached; use it
    Cached(AccessToken),
    /// The token client does not exist yet
    NotReady,
    /// Queued; `start_prompt` is set for the caller that must open the prompt
    Queued {
        receiver: oneshot::Receiver<Result<AccessToken>>,
        start_prompt: bool,
    },
}

#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A panic while holding the guard leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> TokenStatus {
        self.lock().status
    }

    pub fn token(&self) -> Option<AccessToken> {
        self.lock().token.clone()
    }

    pub fn transition(&self, event: SessionEvent) -> Result<TokenStatus> {
        self.lock().transition(event)
    }

    /// Either hand out the cached token or queue the caller.
    pub fn enqueue(&self) -> Admission {
        let mut state = self.lock();

        if state.status.is_authenticated() {
            if let Some(token) = state.token.clone() {
                return Admission::Cached(token);
            }
        }

        if !state.status.is_initialized() {
            return Admission::NotReady;
        }

        let (sender, receiver) = oneshot::channel();
        state.waiters.push_back(sender);
        let start_prompt = !state.prompt_in_flight;
        state.prompt_in_flight = true;

        Admission::Queued {
            receiver,
            start_prompt,
        }
    }

    /// Store a granted token and take every queued waiter, oldest first.
    pub fn grant(&self, token: AccessToken, ends_prompt: bool) -> Result<Vec<Waiter>> {
        let mut state = self.lock();
        state.transition(SessionEvent::TokenGranted)?;
        state.token = Some(token);
        if ends_prompt {
            state.prompt_in_flight = false;
        }
        Ok(state.waiters.drain(..).collect())
    }

    /// Record a failed interactive consent and take every queued waiter.
    ///
    /// The flag is `false` when the failure did not apply, as when a silent
    /// grant authenticated the session while the prompt was open.
    pub fn fail_consent(&self) -> (bool, Vec<Waiter>) {
        let mut state = self.lock();
        let applied = match state.transition(SessionEvent::ConsentFailed) {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Ignoring consent failure");
                false
            }
        };
        state.prompt_in_flight = false;
        (applied, state.waiters.drain(..).collect())
    }

    /// Clear the prompt flag without a response and take the queue.
    pub fn abandon_prompt(&self) -> Vec<Waiter> {
        let mut state = self.lock();
        state.prompt_in_flight = false;
        state.waiters.drain(..).collect()
    }

    /// Drop the cached token. Returns `true` if one was held.
    pub fn invalidate(&self) -> bool {
        let mut state = self.lock();
        let had_token = state.token.take().is_some();
        if let Err(err) = state.transition(SessionEvent::Unauthorized) {
            warn!(error = %err, "Unexpected status while invalidating");
        }
        had_token
    }
}

/// Resolve `waiters` in order with clones of `outcome`.
pub(crate) fn resolve_all(waiters: Vec<Waiter>, outcome: Result<AccessToken>) {
    for waiter in waiters {
        // The caller may have stopped waiting; nothing to do then.
        let _ = waiter.send(outcome.clone());
    }
}

/// Fails the queue with [`AuthError::ConsentAbandoned`] if dropped while armed.
pub(crate) struct PromptGuard<'a> {
    store: &'a SessionStore,
    armed: bool,
}

impl<'a> PromptGuard<'a> {
    pub fn new(store: &'a SessionStore) -> Self {
        Self { store, armed: true }
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PromptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Consent prompt abandoned");
            resolve_all(self.store.abandon_prompt(), Err(AuthError::ConsentAbandoned));
        }
    }
}
