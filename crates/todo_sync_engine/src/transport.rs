//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use todo_store::Config;
use todo_sync_protocol::{RecordId, RemoteSnapshot, SyncEvent, Todo, TodoList};

/// Where and how to reach the user's backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Backend URL, used for both `GET` and `POST`.
    pub url: String,
    /// Headers attached to every request.
    pub headers: BTreeMap<String, String>,
}

impl Endpoint {
    /// Creates an endpoint with no extra headers.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Returns the endpoint described by `config`, or `None` when BYOB is
    /// disabled or no URL is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.is_remote_enabled() {
            return None;
        }
        Some(Self {
            url: config.backend_url.trim().to_string(),
            headers: config.headers.clone(),
        })
    }
}

/// A sync transport handles network communication with the backend.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, mock for testing, etc.). Implementations do not
/// need to enforce timeouts; the engine bounds every call.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Reads the full remote snapshot.
    async fn fetch_snapshot(&self, endpoint: &Endpoint) -> SyncResult<RemoteSnapshot>;

    /// Posts one event.
    async fn send_event(&self, endpoint: &Endpoint, event: &SyncEvent) -> SyncResult<()>;
}

/// Runs `call`, converting an elapsed `timeout` into a network error.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> SyncResult<T>
where
    F: Future<Output = SyncResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::timeout(timeout)),
    }
}

#[derive(Debug, Default)]
struct RemoteState {
    todo_lists: Vec<TodoList>,
    todos: Vec<Todo>,
}

impl RemoteState {
    fn upsert_list(&mut self, list: TodoList) {
        match self.todo_lists.iter_mut().find(|l| l.id == list.id) {
            Some(existing) => *existing = list,
            None => self.todo_lists.push(list),
        }
    }

    fn upsert_todo(&mut self, todo: Todo) {
        match self.todos.iter_mut().find(|t| t.id == todo.id) {
            Some(existing) => *existing = todo,
            None => self.todos.push(todo),
        }
    }

    fn ensure_list(&mut self, list: TodoList) {
        if !self.todo_lists.iter().any(|l| l.id == list.id) {
            self.todo_lists.push(list);
        }
    }

    fn not_found() -> SyncError {
        SyncError::http_status(404, r#"{"message":"Not found!"}"#)
    }

    fn position_of_todo(&self, id: RecordId) -> SyncResult<usize> {
        self.todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(Self::not_found)
    }

    fn position_of_list(&self, id: RecordId) -> SyncResult<usize> {
        self.todo_lists
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(Self::not_found)
    }

    // Key-by-id semantics of a minimal backend: upserts, and 404 for
    // updates or deletes of unknown ids.
    fn apply(&mut self, event: &SyncEvent) -> SyncResult<()> {
        match event {
            SyncEvent::AddTodo(payload) => {
                self.ensure_list(payload.list.clone());
                self.upsert_todo(payload.todo.clone());
            }
            SyncEvent::UpdateTodo(payload) => {
                self.ensure_list(payload.list.clone());
                let index = self.position_of_todo(payload.todo.id)?;
                self.todos[index] = payload.todo.clone();
            }
            SyncEvent::DeleteTodo(payload) => {
                let index = self.position_of_todo(payload.id)?;
                self.todos.remove(index);
            }
            SyncEvent::AddTodoList(list) => self.upsert_list(list.clone()),
            SyncEvent::UpdateTodoList(update) => {
                let index = self.position_of_list(update.id)?;
                update.patch.apply(&mut self.todo_lists[index]);
            }
            SyncEvent::DeleteTodoList(payload) => {
                let index = self.position_of_list(payload.id)?;
                self.todo_lists.remove(index);
            }
            SyncEvent::Sync(payload) => {
                for list in &payload.todo_lists {
                    self.upsert_list(list.clone());
                }
                for todo in &payload.todos {
                    self.upsert_todo(todo.clone());
                }
            }
        }
        Ok(())
    }
}

/// A mock transport for testing.
///
/// Holds a remote snapshot in memory and applies received events to it the
/// way a minimal key-by-id backend would. Failures and latency can be
/// injected.
#[derive(Debug, Default)]
pub struct MockTransport {
    remote: Mutex<RemoteState>,
    events: Mutex<Vec<SyncEvent>>,
    failing_fetches: AtomicU32,
    fail_sends: AtomicBool,
    fetch_attempts: AtomicU64,
    latency: Mutex<Option<Duration>>,
}

impl MockTransport {
    /// Creates a mock transport with an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock transport whose remote starts as `snapshot`.
    pub fn with_snapshot(snapshot: RemoteSnapshot) -> Self {
        let transport = Self::new();
        transport.set_snapshot(snapshot);
        transport
    }

    /// Replaces the remote contents.
    pub fn set_snapshot(&self, snapshot: RemoteSnapshot) {
        *self.remote.lock() = RemoteState {
            todo_lists: snapshot.todo_lists,
            todos: snapshot.todos,
        };
    }

    /// Returns the current remote contents.
    pub fn snapshot(&self) -> RemoteSnapshot {
        let remote = self.remote.lock();
        RemoteSnapshot::new(remote.todo_lists.clone(), remote.todos.clone())
    }

    /// Returns every event received so far, successful or not.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().clone()
    }

    /// Makes the next `count` snapshot fetches fail.
    pub fn fail_next_fetches(&self, count: u32) {
        self.failing_fetches.store(count, Ordering::SeqCst);
    }

    /// Makes every event post fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Number of snapshot fetches attempted.
    pub fn fetch_attempts(&self) -> u64 {
        self.fetch_attempts.load(Ordering::SeqCst)
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl SyncTransport for MockTransport {
    async fn fetch_snapshot(&self, _endpoint: &Endpoint) -> SyncResult<RemoteSnapshot> {
        self.fetch_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let failing = self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SyncError::network("connection refused"));
        }
        Ok(self.snapshot())
    }

    async fn send_event(&self, _endpoint: &Endpoint, event: &SyncEvent) -> SyncResult<()> {
        self.simulate_latency().await;
        self.events.lock().push(event.clone());

        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SyncError::network("connection refused"));
        }
        self.remote.lock().apply(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_sync_protocol::{IdPayload, NewTodo, SyncPayload, TodoPayload};

    fn endpoint() -> Endpoint {
        Endpoint::new("http://localhost:3001/api")
    }

    #[test]
    fn endpoint_requires_byob_and_url() {
        assert_eq!(Endpoint::from_config(&Config::default()), None);
        assert_eq!(Endpoint::from_config(&Config::enabled("")), None);

        let config = Config::enabled(" http://localhost:3001/api ").with_header("X-Key", "k");
        let endpoint = Endpoint::from_config(&config).unwrap();
        assert_eq!(endpoint.url, "http://localhost:3001/api");
        assert_eq!(endpoint.headers.get("X-Key").map(String::as_str), Some("k"));
    }

    #[tokio::test]
    async fn mock_applies_events_by_id() {
        let transport = MockTransport::new();
        let list = TodoList::new(1, "Work", "");
        let todo = Todo::from_new(1, 1, NewTodo::new("a"));

        transport
            .send_event(
                &endpoint(),
                &SyncEvent::AddTodo(TodoPayload {
                    list: list.clone(),
                    todo: todo.clone(),
                }),
            )
            .await
            .unwrap();

        let snapshot = transport.fetch_snapshot(&endpoint()).await.unwrap();
        assert_eq!(snapshot.todo_lists, vec![list]);
        assert_eq!(snapshot.todos, vec![todo]);
    }

    #[tokio::test]
    async fn mock_rejects_unknown_deletes() {
        let transport = MockTransport::new();
        let result = transport
            .send_event(&endpoint(), &SyncEvent::DeleteTodo(IdPayload { id: 9 }))
            .await;
        assert!(matches!(
            result,
            Err(SyncError::Network {
                status: Some(404),
                ..
            })
        ));
        assert_eq!(transport.events().len(), 1);
    }

    #[tokio::test]
    async fn mock_sync_upserts_everything() {
        let transport = MockTransport::with_snapshot(RemoteSnapshot::new(
            vec![TodoList::new(1, "Old title", "")],
            Vec::new(),
        ));
        let payload = SyncPayload {
            todos: vec![Todo::from_new(1, 2, NewTodo::new("a"))],
            todo_lists: vec![TodoList::new(1, "New title", ""), TodoList::new(2, "B", "")],
            force: false,
        };
        transport
            .send_event(&endpoint(), &SyncEvent::Sync(payload))
            .await
            .unwrap();

        let snapshot = transport.snapshot();
        assert_eq!(snapshot.todo_list_count(), 2);
        assert_eq!(snapshot.todo_lists[0].title, "New title");
        assert_eq!(snapshot.todo_count(), 1);
    }

    #[tokio::test]
    async fn mock_fetch_failure_injection() {
        let transport = MockTransport::new();
        transport.fail_next_fetches(1);

        assert!(transport.fetch_snapshot(&endpoint()).await.is_err());
        assert!(transport.fetch_snapshot(&endpoint()).await.is_ok());
        assert_eq!(transport.fetch_attempts(), 2);
    }

    #[tokio::test]
    async fn bounded_converts_timeout() {
        let result: SyncResult<()> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(SyncError::Network { timed_out, .. }) => assert!(timed_out),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
