//! CLI command implementations.

pub mod config;
pub mod list;
pub mod show;
pub mod sync;
pub mod todo;

pub use config::ConfigCommand;
pub use list::ListCommand;
pub use todo::TodoCommand;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use todo_store::{ConfigStore, FileBackend, LocalStore, StoreError};
use todo_sync_engine::{
    EngineConfig, HttpTransport, Notification, Notifier, SyncEngine, SyncError,
};
use todo_sync_protocol::{Priority, TodoStatus};
use tracing::info;

/// Result type shared by the command handlers.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Opened local state plus the engine wired to it.
pub struct Context {
    /// Persisted BYOB configuration.
    pub config: Arc<ConfigStore<FileBackend>>,
    /// Sync engine owning the local store.
    pub engine: SyncEngine<HttpTransport, FileBackend>,
}

impl Context {
    /// Opens (creating if needed) the data directory at `path`.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Arc::new(ConfigStore::open(FileBackend::open(path)?)?);
        let store = Arc::new(LocalStore::open(FileBackend::open(path)?)?);
        let transport = Arc::new(HttpTransport::new()?);

        let engine = SyncEngine::with_notifier(
            EngineConfig::new().with_timeout(timeout),
            store,
            config.clone(),
            transport,
            Arc::new(StderrNotifier),
        );
        Ok(Self { config, engine })
    }

    /// Returns the local store.
    pub fn store(&self) -> &LocalStore<FileBackend> {
        self.engine.store()
    }
}

/// Prints sync errors to stderr; successes go to the log.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => info!("{message}"),
            Notification::Error(message) => eprintln!("error: {message}"),
        }
    }
}

/// Exit status for a failed command: 2 when the store rejected the input,
/// 1 for everything else.
pub fn exit_code(error: &(dyn std::error::Error + 'static)) -> i32 {
    let store_error = error
        .downcast_ref::<StoreError>()
        .or_else(|| match error.downcast_ref::<SyncError>() {
            Some(SyncError::Store(e)) => Some(e),
            _ => None,
        });
    match store_error {
        Some(e) if e.is_rejection() => 2,
        _ => 1,
    }
}

/// Parses a status, accepting `in progress`, `in-progress` and `in_progress`.
pub fn parse_status(s: &str) -> Result<TodoStatus, String> {
    let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
    TodoStatus::ALL
        .into_iter()
        .find(|status| status.as_str() == normalized)
        .ok_or_else(|| {
            let names: Vec<_> = TodoStatus::ALL.iter().map(TodoStatus::as_str).collect();
            format!("unknown status {s:?} (expected one of: {})", names.join(", "))
        })
}

/// Parses a priority.
pub fn parse_priority(s: &str) -> Result<Priority, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        _ => Err(format!("unknown priority {s:?} (expected low, medium or high)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_spellings() {
        assert_eq!(parse_status("in progress"), Ok(TodoStatus::InProgress));
        assert_eq!(parse_status("In-Progress"), Ok(TodoStatus::InProgress));
        assert_eq!(parse_status("in_progress"), Ok(TodoStatus::InProgress));
        assert_eq!(parse_status("done"), Ok(TodoStatus::Done));
        assert!(parse_status("finished").is_err());
    }

    #[test]
    fn rejections_exit_with_two() {
        let rejected: Box<dyn std::error::Error> = StoreError::NoActiveList.into();
        assert_eq!(exit_code(&*rejected), 2);

        let wrapped: Box<dyn std::error::Error> = SyncError::from(StoreError::NoActiveList).into();
        assert_eq!(exit_code(&*wrapped), 2);

        let io: Box<dyn std::error::Error> =
            StoreError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(exit_code(&*io), 1);

        let network: Box<dyn std::error::Error> = SyncError::NotConfigured.into();
        assert_eq!(exit_code(&*network), 1);

        let message: Box<dyn std::error::Error> = "nothing to update".into();
        assert_eq!(exit_code(&*message), 1);
    }

    #[test]
    fn priority_spellings() {
        assert_eq!(parse_priority("HIGH"), Ok(Priority::High));
        assert!(parse_priority("urgent").is_err());
    }
}
