//! Notification sink that writes user messages to the log.

use bridge_traits::host::{NotificationSink, Severity};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{error, info};

/// Logs every notification and keeps the most recent ones for display.
pub struct TracingNotificationSink {
    capacity: usize,
    recent: Mutex<VecDeque<(Severity, String)>>,
}

impl TracingNotificationSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Retained notifications, oldest first
    pub fn recent(&self) -> Vec<(Severity, String)> {
        self.lock().iter().cloned().collect()
    }

    /// The last notification, if any
    pub fn last(&self) -> Option<(Severity, String)> {
        self.lock().back().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(Severity, String)>> {
        self.recent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TracingNotificationSink {
    fn default() -> Self {
        Self::new(32)
    }
}

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!(target: "accountable_drive::notify", "{}", message),
            Severity::Error => error!(target: "accountable_drive::notify", "{}", message),
        }

        if self.capacity == 0 {
            return;
        }
        let mut recent = self.lock();
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back((severity, message.to_string()));
    }
}
