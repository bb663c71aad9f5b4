//! Event publisher: the store's outbox.
//!
//! Every accepted local mutation is handed to [`EventPublisher::publish`],
//! which posts it to the backend on a spawned tokio task. Publishing is
//! best-effort. There is no retry and no ordering between publishes, and
//! a failure is reported without touching local state.

use crate::config::EngineConfig;
use crate::notify::{Notification, Notifier};
use crate::transport::{bounded, Endpoint, SyncTransport};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use todo_store::{ConfigSource, Outbox};
use todo_sync_protocol::SyncEvent;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Counters for published events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Events the backend accepted.
    pub published: u64,
    /// Events that failed to send.
    pub failed: u64,
    /// Events not sent because remote sync is off.
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Posts store events to the configured backend.
pub struct EventPublisher<T: SyncTransport> {
    transport: Arc<T>,
    config: Arc<dyn ConfigSource>,
    notifier: Arc<dyn Notifier>,
    request_timeout: Duration,
    counters: Arc<Counters>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: SyncTransport + 'static> EventPublisher<T> {
    /// Creates a publisher.
    pub fn new(
        transport: Arc<T>,
        config: Arc<dyn ConfigSource>,
        notifier: Arc<dyn Notifier>,
        engine_config: &EngineConfig,
    ) -> Self {
        Self {
            transport,
            config,
            notifier,
            request_timeout: engine_config.request_timeout,
            counters: Arc::new(Counters::default()),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Returns the publish counters.
    pub fn stats(&self) -> PublishStats {
        PublishStats {
            published: self.counters.published.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            skipped: self.counters.skipped.load(Ordering::SeqCst),
        }
    }

    /// Number of publishes still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Waits until every publish started so far has finished.
    pub async fn flush(&self) {
        loop {
            let handles = std::mem::take(&mut *self.in_flight.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "publish task did not complete");
                }
            }
        }
    }

    fn send(&self, endpoint: Endpoint, event: SyncEvent) {
        let event_type = event.event_type();
        let Ok(runtime) = Handle::try_current() else {
            self.counters.failed.fetch_add(1, Ordering::SeqCst);
            warn!(event = %event_type, "no async runtime; event dropped");
            self.notifier.notify(Notification::error(format!(
                "Failed to publish {event_type} event: no async runtime"
            )));
            return;
        };

        let transport = Arc::clone(&self.transport);
        let notifier = Arc::clone(&self.notifier);
        let counters = Arc::clone(&self.counters);
        let timeout = self.request_timeout;

        let handle = runtime.spawn(async move {
            match bounded(timeout, transport.send_event(&endpoint, &event)).await {
                Ok(()) => {
                    counters.published.fetch_add(1, Ordering::SeqCst);
                    debug!(event = %event_type, "event published");
                    notifier.notify(Notification::success(format!("Event {event_type} published")));
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    warn!(event = %event_type, error = %e, "failed to publish event");
                    notifier.notify(Notification::error(format!(
                        "Failed to publish {event_type} event: {e}"
                    )));
                }
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}

impl<T: SyncTransport + 'static> Outbox for EventPublisher<T> {
    fn publish(&self, event: SyncEvent) {
        match Endpoint::from_config(&self.config.current()) {
            Some(endpoint) => self.send(endpoint, event),
            None => {
                self.counters.skipped.fetch_add(1, Ordering::SeqCst);
                debug!(event = %event.event_type(), "remote sync disabled; event not sent");
            }
        }
    }
}
