//! Sync orchestration: pull, push and the eligibility heuristic.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::fetcher::RemoteFetcher;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::publisher::{EventPublisher, PublishStats};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::transport::{bounded, Endpoint, SyncTransport};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use todo_store::{ConfigSource, KeyValueBackend, LocalStore, Store};
use todo_sync_protocol::{RemoteSnapshot, SyncEvent};
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Engine is idle, not syncing.
    #[default]
    Idle,
    /// Engine is pulling from the backend.
    Pulling,
    /// Engine is pushing to the backend.
    Pushing,
}

impl SyncState {
    /// Returns true if a pull or push is running.
    pub fn is_active(&self) -> bool {
        !matches!(self, SyncState::Idle)
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Pulls that reached the backend and merged.
    pub pulls_completed: u64,
    /// Pushes the backend accepted.
    pub pushes_completed: u64,
    /// Pushes refused by the eligibility heuristic.
    pub pushes_skipped: u64,
    /// Records imported by pulls.
    pub records_imported: u64,
    /// Last sync time.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Count-based guess at which side is ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEligibility {
    /// The local side has more todos or more lists.
    pub should_push: bool,
    /// The remote side has more todos or more lists.
    pub should_pull: bool,
}

impl SyncEligibility {
    /// Compares a local store with a remote snapshot.
    pub fn compute(local: &Store, remote: &RemoteSnapshot) -> Self {
        Self::from_counts(
            (local.todo_lists.len(), local.todos.len()),
            (remote.todo_list_count(), remote.todo_count()),
        )
    }

    /// Compares `(lists, todos)` counts.
    pub fn from_counts(local: (usize, usize), remote: (usize, usize)) -> Self {
        let (local_lists, local_todos) = local;
        let (remote_lists, remote_todos) = remote;
        Self {
            should_push: local_todos > remote_todos || local_lists > remote_lists,
            should_pull: remote_todos > local_todos || remote_lists > local_lists,
        }
    }
}

/// Result of [`SyncEngine::pull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote sync is off or the backend could not be read.
    Unavailable,
    /// The snapshot was merged.
    Merged(ReconcileOutcome),
}

/// Result of [`SyncEngine::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The whole store was sent.
    Pushed {
        /// Lists sent.
        todo_lists: usize,
        /// Todos sent.
        todos: usize,
        /// Whether the push was forced.
        forced: bool,
    },
    /// Not sent: the remote does not appear to be behind.
    Skipped(SyncEligibility),
}

// Marks the engine busy for the lifetime of one pull or push.
struct FlightGuard<'a> {
    busy: &'a AtomicBool,
    state: &'a RwLock<SyncState>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *self.state.write() = SyncState::Idle;
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// The sync engine: wires the local store to a backend.
///
/// Construction attaches an [`EventPublisher`] as the store's outbox, so
/// every later mutation is published. [`pull`](Self::pull) and
/// [`push`](Self::push) are single-flight: a second call while one is
/// running fails with [`SyncError::Busy`].
pub struct SyncEngine<T: SyncTransport + 'static, B: KeyValueBackend> {
    engine_config: EngineConfig,
    store: Arc<LocalStore<B>>,
    config: Arc<dyn ConfigSource>,
    transport: Arc<T>,
    notifier: Arc<dyn Notifier>,
    publisher: Arc<EventPublisher<T>>,
    fetcher: RemoteFetcher<T>,
    reconciler: Reconciler,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    busy: AtomicBool,
}

impl<T: SyncTransport + 'static, B: KeyValueBackend> SyncEngine<T, B> {
    /// Creates an engine that reports through [`TracingNotifier`].
    pub fn new(
        engine_config: EngineConfig,
        store: Arc<LocalStore<B>>,
        config: Arc<dyn ConfigSource>,
        transport: Arc<T>,
    ) -> Self {
        Self::with_notifier(
            engine_config,
            store,
            config,
            transport,
            Arc::new(TracingNotifier),
        )
    }

    /// Creates an engine with a custom notifier.
    pub fn with_notifier(
        engine_config: EngineConfig,
        store: Arc<LocalStore<B>>,
        config: Arc<dyn ConfigSource>,
        transport: Arc<T>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let publisher = Arc::new(EventPublisher::new(
            Arc::clone(&transport),
            Arc::clone(&config),
            Arc::clone(&notifier),
            &engine_config,
        ));
        store.set_outbox(publisher.clone());

        let fetcher = RemoteFetcher::new(
            Arc::clone(&transport),
            Arc::clone(&config),
            Arc::clone(&notifier),
            engine_config.clone(),
        );

        Self {
            engine_config,
            store,
            config,
            transport,
            notifier,
            publisher,
            fetcher,
            reconciler: Reconciler::default(),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            busy: AtomicBool::new(false),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Gets the publisher counters.
    pub fn publish_stats(&self) -> PublishStats {
        self.publisher.stats()
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<LocalStore<B>> {
        &self.store
    }

    /// Returns the event publisher.
    pub fn publisher(&self) -> &Arc<EventPublisher<T>> {
        &self.publisher
    }

    /// Waits for every in-flight publish.
    pub async fn flush(&self) {
        self.publisher.flush().await;
    }

    /// Fetches the remote snapshot and compares counts, or `None` when the
    /// backend is unavailable.
    pub async fn eligibility(&self) -> Option<SyncEligibility> {
        let remote = self.fetcher.fetch().await?;
        Some(SyncEligibility::compute(&self.store.snapshot(), &remote))
    }

    /// Imports remote-only records into the local store.
    ///
    /// Returns [`PullOutcome::Unavailable`] when remote sync is disabled or
    /// the backend cannot be read; the failure is reported to the notifier.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Busy`] if another operation is running, or a
    /// store error if the merged state cannot be written.
    pub async fn pull(&self) -> SyncResult<PullOutcome> {
        let _guard = self.begin(SyncState::Pulling)?;

        let Some(endpoint) = self.fetcher.endpoint() else {
            debug!("remote sync disabled; nothing to pull");
            return Ok(PullOutcome::Unavailable);
        };

        let remote = match self.fetcher.fetch_from(&endpoint).await {
            Ok(remote) => remote,
            Err(e) => {
                self.report(&format!("Failed to fetch remote data: {e}"), &e);
                return Ok(PullOutcome::Unavailable);
            }
        };

        let outcome = match self.reconciler.apply(&self.store, &remote) {
            Ok(outcome) => outcome,
            Err(e) => {
                let e = SyncError::from(e);
                self.report(&format!("Failed to save pulled data: {e}"), &e);
                return Err(e);
            }
        };

        {
            let mut stats = self.stats.write();
            stats.pulls_completed += 1;
            stats.records_imported += outcome.records_added() as u64;
            stats.last_sync_time = Some(Instant::now());
            stats.last_error = None;
        }
        info!(
            lists = outcome.lists_added,
            todos = outcome.todos_added,
            dangling = outcome.dangling_todos,
            "pull complete"
        );
        self.notifier.notify(Notification::success(format!(
            "Pulled {} lists and {} todos",
            outcome.lists_added, outcome.todos_added
        )));
        Ok(PullOutcome::Merged(outcome))
    }

    /// Sends the whole local store as one `sync` event.
    ///
    /// `force` defaults to the configured force-push flag. Unless forced,
    /// the push is skipped when the remote does not appear to be behind. If
    /// the remote cannot be read to check, the push goes ahead.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotConfigured`] when remote sync is disabled,
    /// [`SyncError::Busy`] if another operation is running, or the network
    /// error of the post.
    pub async fn push(&self, force: Option<bool>) -> SyncResult<PushOutcome> {
        let _guard = self.begin(SyncState::Pushing)?;

        let config = self.config.current();
        let endpoint = Endpoint::from_config(&config).ok_or(SyncError::NotConfigured)?;
        let force = force.unwrap_or(config.force_push);

        if !force {
            match self.fetcher.fetch_from(&endpoint).await {
                Ok(remote) => {
                    let eligibility = SyncEligibility::compute(&self.store.snapshot(), &remote);
                    if !eligibility.should_push {
                        info!(?eligibility, "remote is not behind; push skipped");
                        self.stats.write().pushes_skipped += 1;
                        return Ok(PushOutcome::Skipped(eligibility));
                    }
                }
                Err(e) => warn!(error = %e, "cannot compare with remote; pushing anyway"),
            }
        }

        let local = self.store.snapshot();
        let event = SyncEvent::Sync(local.to_sync_payload(force));
        let sent = bounded(
            self.engine_config.request_timeout,
            self.transport.send_event(&endpoint, &event),
        )
        .await;

        if let Err(e) = sent {
            self.report(&format!("Failed to push local data: {e}"), &e);
            return Err(e);
        }

        {
            let mut stats = self.stats.write();
            stats.pushes_completed += 1;
            stats.last_sync_time = Some(Instant::now());
            stats.last_error = None;
        }
        info!(
            lists = local.todo_lists.len(),
            todos = local.todos.len(),
            force,
            "push complete"
        );
        self.notifier.notify(Notification::success("Store synced"));
        Ok(PushOutcome::Pushed {
            todo_lists: local.todo_lists.len(),
            todos: local.todos.len(),
            forced: force,
        })
    }

    fn begin(&self, state: SyncState) -> SyncResult<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SyncError::Busy)?;
        *self.state.write() = state;
        Ok(FlightGuard {
            busy: &self.busy,
            state: &self.state,
        })
    }

    fn report(&self, message: &str, error: &SyncError) {
        warn!(error = %error, "{message}");
        self.stats.write().last_error = Some(error.to_string());
        self.notifier.notify(Notification::error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_local_lists_means_push() {
        let eligibility = SyncEligibility::from_counts((3, 0), (1, 0));
        assert!(eligibility.should_push);
        assert!(!eligibility.should_pull);
    }

    #[test]
    fn equal_counts_mean_neither() {
        let eligibility = SyncEligibility::from_counts((2, 5), (2, 5));
        assert!(!eligibility.should_push);
        assert!(!eligibility.should_pull);
    }

    #[test]
    fn mixed_counts_can_mean_both() {
        let eligibility = SyncEligibility::from_counts((3, 1), (1, 4));
        assert!(eligibility.should_push);
        assert!(eligibility.should_pull);
    }

    #[test]
    fn compute_uses_collection_sizes() {
        let local = Store {
            current_todo_list_id: None,
            todo_lists: Vec::new(),
            todos: Vec::new(),
        };
        let remote = RemoteSnapshot::new(
            vec![todo_sync_protocol::TodoList::new(1, "Work", "")],
            Vec::new(),
        );
        let eligibility = SyncEligibility::compute(&local, &remote);
        assert!(eligibility.should_pull);
        assert!(!eligibility.should_push);
    }

    #[test]
    fn state_activity() {
        assert!(!SyncState::Idle.is_active());
        assert!(SyncState::Pulling.is_active());
        assert!(SyncState::Pushing.is_active());
    }
}
