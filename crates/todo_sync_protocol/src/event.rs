//! Events posted to a backend.
//!
//! Every accepted local mutation is described by exactly one [`SyncEvent`].
//! The JSON form is `{ "type": <EventType>, "payload": <...> }`.

use crate::error::{ProtocolError, ProtocolResult};
use crate::model::{RecordId, Todo, TodoList, TodoListPatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Content type used for every request body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// `Access-Control-Allow-Origin` value a backend must send to browser callers.
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// `Access-Control-Allow-Headers` value a backend must send to browser callers.
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Accept, access-control-allow-origin";

/// The `type` tag of a [`SyncEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A todo was created.
    AddTodo,
    /// A todo was updated.
    UpdateTodo,
    /// A todo was deleted.
    DeleteTodo,
    /// A list was created.
    AddTodoList,
    /// A list was updated.
    UpdateTodoList,
    /// A list was deleted.
    DeleteTodoList,
    /// Bulk overwrite with the whole local store.
    Sync,
}

impl EventType {
    /// All event types.
    pub const ALL: [EventType; 7] = [
        EventType::AddTodo,
        EventType::UpdateTodo,
        EventType::DeleteTodo,
        EventType::AddTodoList,
        EventType::UpdateTodoList,
        EventType::DeleteTodoList,
        EventType::Sync,
    ];

    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::AddTodo => "add_todo",
            EventType::UpdateTodo => "update_todo",
            EventType::DeleteTodo => "delete_todo",
            EventType::AddTodoList => "add_todo_list",
            EventType::UpdateTodoList => "update_todo_list",
            EventType::DeleteTodoList => "delete_todo_list",
            EventType::Sync => "sync",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownEventType(s.to_string()))
    }
}

/// Payload of `add_todo` and `update_todo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPayload {
    /// The list the todo belongs to, or [`TodoList::placeholder`].
    pub list: TodoList,
    /// The todo after the mutation.
    pub todo: Todo,
}

/// Payload carrying only an id (`delete_todo`, `delete_todo_list`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPayload {
    /// Id of the deleted record.
    pub id: RecordId,
}

/// Payload of `update_todo_list`: the id plus only the changed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListUpdate {
    /// Id of the updated list.
    pub id: RecordId,
    /// Changed fields.
    #[serde(flatten)]
    pub patch: TodoListPatch,
}

/// Payload of `sync`: the entire local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// All local todos.
    #[serde(default)]
    pub todos: Vec<Todo>,
    /// All local lists.
    #[serde(rename = "todoLists", alias = "todoList", default)]
    pub todo_lists: Vec<TodoList>,
    /// Overwrite a remote that appears to be ahead.
    #[serde(default)]
    pub force: bool,
}

/// An event describing one local mutation, or a bulk push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A todo was created.
    AddTodo(TodoPayload),
    /// A todo was updated.
    UpdateTodo(TodoPayload),
    /// A todo was deleted.
    DeleteTodo(IdPayload),
    /// A list was created.
    AddTodoList(TodoList),
    /// A list was updated.
    UpdateTodoList(TodoListUpdate),
    /// A list was deleted.
    DeleteTodoList(IdPayload),
    /// Bulk overwrite.
    Sync(SyncPayload),
}

impl SyncEvent {
    /// Returns the event type tag.
    pub fn event_type(&self) -> EventType {
        match self {
            SyncEvent::AddTodo(_) => EventType::AddTodo,
            SyncEvent::UpdateTodo(_) => EventType::UpdateTodo,
            SyncEvent::DeleteTodo(_) => EventType::DeleteTodo,
            SyncEvent::AddTodoList(_) => EventType::AddTodoList,
            SyncEvent::UpdateTodoList(_) => EventType::UpdateTodoList,
            SyncEvent::DeleteTodoList(_) => EventType::DeleteTodoList,
            SyncEvent::Sync(_) => EventType::Sync,
        }
    }

    /// Encodes to a JSON body.
    pub fn to_json(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a JSON body.
    ///
    /// Unknown `type` tags are rejected with [`ProtocolError::UnknownEventType`]
    /// before the payload is looked at.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Decodes an already parsed JSON value.
    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        let event_type: EventType = match value.get("type").and_then(Value::as_str) {
            Some(tag) => tag.parse()?,
            None => return Err(ProtocolError::invalid_payload("event", "missing `type` tag")),
        };

        serde_json::from_value(value)
            .map_err(|e| ProtocolError::invalid_payload(event_type.as_str(), e.to_string()))
    }
}
