//! File-backed store tests.

use std::fs;
use todo_store::{
    Config, ConfigStore, FileBackend, LocalStore, StoreError, CONFIG_KEY, SCHEMA_VERSION,
    STORE_KEY,
};
use todo_sync_protocol::{NewTodo, NewTodoList, Priority, TodoListPatch};

#[test]
fn store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = LocalStore::open(FileBackend::open(dir.path()).unwrap()).unwrap();
        store.add_todo_list(NewTodoList::new("Work", "")).unwrap();
        store
            .add_todo(NewTodo::new("report").with_priority(Priority::High))
            .unwrap();
        store
            .update_todo_list(
                1,
                TodoListPatch {
                    title: Some("Job".into()),
                    description: None,
                },
            )
            .unwrap();
    }

    let store = LocalStore::open(FileBackend::open(dir.path()).unwrap()).unwrap();
    assert_eq!(store.counts(), (1, 1));
    assert_eq!(store.todo_lists()[0].title, "Job");
    assert_eq!(store.todos()[0].priority, Priority::High);
    assert_eq!(store.current_todo_list_id(), Some(1));
}

#[test]
fn records_are_written_with_version_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(FileBackend::open(dir.path()).unwrap()).unwrap();
    store.add_todo_list(NewTodoList::new("Work", "")).unwrap();

    let raw = fs::read(dir.path().join(format!("{STORE_KEY}.json"))).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["version"], u64::from(SCHEMA_VERSION));
    assert_eq!(value["data"]["todoLists"][0]["title"], "Work");
}

#[test]
fn unversioned_files_are_upgraded_on_next_write() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(format!("{CONFIG_KEY}.json")),
        br#"{"backendUrl": "http://localhost:3001/api", "headers": {}, "byob": true}"#,
    )
    .unwrap();

    let config = ConfigStore::open(FileBackend::open(dir.path()).unwrap()).unwrap();
    assert!(config.config().is_remote_enabled());
    config.toggle_force_push().unwrap();

    let raw = fs::read(dir.path().join(format!("{CONFIG_KEY}.json"))).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["version"], u64::from(SCHEMA_VERSION));
    assert_eq!(value["data"]["byobEnabled"], true);
    assert_eq!(value["data"]["forcePush"], true);
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(format!("{STORE_KEY}.json")),
        br#"{"version": 99, "data": {}}"#,
    )
    .unwrap();

    let result = LocalStore::open(FileBackend::open(dir.path()).unwrap());
    assert!(matches!(
        result,
        Err(StoreError::UnsupportedVersion { found: 99, .. })
    ));
}

#[test]
fn config_defaults_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigStore::open(FileBackend::open(dir.path()).unwrap()).unwrap();
    assert_eq!(config.config(), Config::default());
}
