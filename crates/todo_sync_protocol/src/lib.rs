//! # Todo Sync Protocol
//!
//! Data model and wire types for BYOB ("bring your own backend") todo sync.
//!
//! This crate provides:
//! - [`Todo`] and [`TodoList`] records, plus the patches used to update them
//! - [`SyncEvent`], the tagged union posted to a backend after each mutation
//! - [`RemoteSnapshot`], the body returned by `GET <backendUrl>`
//! - [`MergePolicy`], the explicit rule applied when local and remote ids collide
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Wire contract
//!
//! ```text
//! GET  <backendUrl>  -> 200 { "todos": [...], "todoLists": [...] }
//! POST <backendUrl>  <- { "type": "<event type>", "payload": { ... } }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod event;
mod model;
mod policy;
mod snapshot;

pub use error::{ProtocolError, ProtocolResult};
pub use event::{
    EventType, IdPayload, SyncEvent, SyncPayload, TodoListUpdate, TodoPayload,
    CONTENT_TYPE_JSON, CORS_ALLOW_HEADERS, CORS_ALLOW_ORIGIN,
};
pub use model::{
    Identified, NewTodo, NewTodoList, Priority, RecordId, RecordKind, Todo, TodoList,
    TodoListPatch, TodoPatch, TodoStatus,
};
pub use policy::{MergePolicy, Resolution, MERGE_POLICY};
pub use snapshot::RemoteSnapshot;
