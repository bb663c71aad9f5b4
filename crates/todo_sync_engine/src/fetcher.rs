//! Remote snapshot fetcher.

use crate::config::{EngineConfig, MAX_FETCH_ATTEMPTS};
use crate::error::SyncResult;
use crate::notify::{Notification, Notifier};
use crate::transport::{bounded, Endpoint, SyncTransport};
use std::sync::Arc;
use todo_store::ConfigSource;
use todo_sync_protocol::RemoteSnapshot;
use tracing::{debug, warn};

/// Reads the full remote snapshot, with a bounded retry.
pub struct RemoteFetcher<T: SyncTransport> {
    transport: Arc<T>,
    config: Arc<dyn ConfigSource>,
    notifier: Arc<dyn Notifier>,
    engine_config: EngineConfig,
}

impl<T: SyncTransport> RemoteFetcher<T> {
    /// Creates a fetcher.
    pub fn new(
        transport: Arc<T>,
        config: Arc<dyn ConfigSource>,
        notifier: Arc<dyn Notifier>,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            transport,
            config,
            notifier,
            engine_config,
        }
    }

    /// Returns the configured endpoint, if remote sync is enabled.
    pub fn endpoint(&self) -> Option<Endpoint> {
        Endpoint::from_config(&self.config.current())
    }

    /// Fetches the snapshot, or `None` when remote sync is disabled or the
    /// backend cannot be read. Failures are reported to the notifier.
    pub async fn fetch(&self) -> Option<RemoteSnapshot> {
        let Some(endpoint) = self.endpoint() else {
            debug!("remote sync disabled; skipping fetch");
            return None;
        };
        match self.fetch_from(&endpoint).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                self.notifier
                    .notify(Notification::error(format!("Failed to fetch remote data: {e}")));
                None
            }
        }
    }

    /// Fetches the snapshot from `endpoint`, retrying retryable failures up
    /// to the configured attempt count, never more than
    /// [`MAX_FETCH_ATTEMPTS`].
    pub async fn fetch_from(&self, endpoint: &Endpoint) -> SyncResult<RemoteSnapshot> {
        let retry = &self.engine_config.fetch_retry;
        let max_attempts = retry.max_attempts.clamp(1, MAX_FETCH_ATTEMPTS);
        let mut attempt = 0;

        loop {
            let delay = retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = bounded(
                self.engine_config.request_timeout,
                self.transport.fetch_snapshot(endpoint),
            )
            .await;

            match result {
                Ok(snapshot) => {
                    debug!(
                        lists = snapshot.todo_list_count(),
                        todos = snapshot.todo_count(),
                        attempt,
                        "fetched remote snapshot"
                    );
                    return Ok(snapshot);
                }
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    warn!(error = %e, attempt, "snapshot fetch failed; retrying");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(error = %e, attempt, "snapshot fetch failed");
                    return Err(e);
                }
            }
        }
    }
}
