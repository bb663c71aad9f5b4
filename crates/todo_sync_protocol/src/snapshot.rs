//! Remote snapshot returned by `GET <backendUrl>`.

use crate::error::ProtocolResult;
use crate::model::{Todo, TodoList};
use serde::{Deserialize, Serialize};

/// A full point-in-time copy of the remote collections.
///
/// Snapshots are ephemeral: fetched for one pull, consumed by the reconciler,
/// then dropped. Missing collections decode as empty, and the list collection
/// is also accepted under the `todoList` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    /// Remote todos.
    #[serde(default)]
    pub todos: Vec<Todo>,
    /// Remote lists.
    #[serde(rename = "todoLists", alias = "todoList", default)]
    pub todo_lists: Vec<TodoList>,
}

impl RemoteSnapshot {
    /// Creates a snapshot.
    pub fn new(todo_lists: Vec<TodoList>, todos: Vec<Todo>) -> Self {
        Self { todos, todo_lists }
    }

    /// Number of remote todos.
    pub fn todo_count(&self) -> usize {
        self.todos.len()
    }

    /// Number of remote lists.
    pub fn todo_list_count(&self) -> usize {
        self.todo_lists.len()
    }

    /// Returns true if both collections are empty.
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty() && self.todo_lists.is_empty()
    }

    /// Decodes a JSON body.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encodes to a JSON body.
    pub fn to_json(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
