//! User-facing notifications.
//!
//! Sync failures are never fatal. They are reported here so the caller can
//! show them (a toast, a stderr line) and carry on.

use parking_lot::Mutex;
use std::fmt;
use tracing::{info, warn};

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Something completed.
    Success(String),
    /// Something failed; local state is unaffected.
    Error(String),
}

impl Notification {
    /// Creates a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Returns true for [`Notification::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }

    /// Returns the message text.
    pub fn message(&self) -> &str {
        match self {
            Notification::Success(m) | Notification::Error(m) => m,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives notifications.
pub trait Notifier: Send + Sync {
    /// Delivers one notification. Must not block.
    fn notify(&self, notification: Notification);
}

/// Logs notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => info!("{message}"),
            Notification::Error(message) => warn!("{message}"),
        }
    }
}

/// Records notifications in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything received so far.
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// Returns the error notifications received so far.
    pub fn errors(&self) -> Vec<Notification> {
        self.received
            .lock()
            .iter()
            .filter(|n| n.is_error())
            .cloned()
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_records() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::success("Store synced"));
        notifier.notify(Notification::error("failed to publish"));

        assert_eq!(notifier.received().len(), 2);
        assert_eq!(notifier.errors(), vec![Notification::error("failed to publish")]);
        assert_eq!(notifier.errors()[0].to_string(), "failed to publish");
    }
}
