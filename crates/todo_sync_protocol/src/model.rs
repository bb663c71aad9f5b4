//! Todo and todo-list records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer identifier of a todo or todo list.
///
/// Ids are unique within their own collection only.
pub type RecordId = i64;

/// The two record collections kept in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A [`Todo`].
    Todo,
    /// A [`TodoList`].
    TodoList,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Todo => write!(f, "todo"),
            RecordKind::TodoList => write!(f, "todo list"),
        }
    }
}

/// A record that is keyed by a [`RecordId`].
pub trait Identified {
    /// Returns the record id.
    fn id(&self) -> RecordId;
}

/// A named list that groups todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    /// List id.
    pub id: RecordId,
    /// Title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl TodoList {
    /// Creates a todo list.
    pub fn new(id: RecordId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
        }
    }

    /// The placeholder list sent with todo events whose list is not known locally.
    pub fn placeholder() -> Self {
        Self::new(0, "", "")
    }
}

impl Identified for TodoList {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Workflow status of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Not yet planned.
    Backlog,
    /// Planned.
    #[default]
    Todo,
    /// Being worked on. Serialized as `"in progress"`.
    #[serde(rename = "in progress", alias = "in_progress")]
    InProgress,
    /// Finished.
    Done,
    /// Abandoned.
    Canceled,
}

impl TodoStatus {
    /// All statuses, in display order.
    pub const ALL: [TodoStatus; 5] = [
        TodoStatus::Backlog,
        TodoStatus::Todo,
        TodoStatus::InProgress,
        TodoStatus::Done,
        TodoStatus::Canceled,
    ];

    /// Returns the wire spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Backlog => "backlog",
            TodoStatus::Todo => "todo",
            TodoStatus::InProgress => "in progress",
            TodoStatus::Done => "done",
            TodoStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low.
    Low,
    /// Medium.
    #[default]
    Medium,
    /// High.
    High,
}

impl Priority {
    /// Returns the wire spelling of the priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Todo id.
    pub id: RecordId,
    /// Title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Workflow status.
    pub status: TodoStatus,
    /// Priority.
    pub priority: Priority,
    /// Id of the owning list. May dangle for todos imported from a remote.
    pub todo_list_id: RecordId,
}

impl Todo {
    /// Builds a todo from creation input.
    pub fn from_new(id: RecordId, todo_list_id: RecordId, new: NewTodo) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            todo_list_id,
        }
    }
}

impl Identified for Todo {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// Input for creating a todo list. The id is assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodoList {
    /// Title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl NewTodoList {
    /// Creates list input.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Input for creating a todo. Id and list are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// Title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Initial status.
    #[serde(default)]
    pub status: TodoStatus,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
}

impl NewTodo {
    /// Creates todo input with default status and priority.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: TodoStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Partial update of a todo list. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TodoListPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Applies the patch in place.
    pub fn apply(&self, list: &mut TodoList) {
        if let Some(title) = &self.title {
            list.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            list.description.clone_from(description);
        }
    }
}

/// Partial update of a todo. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Move to another list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_list_id: Option<RecordId>,
}

impl TodoPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.todo_list_id.is_none()
    }

    /// Applies the patch in place.
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            todo.description.clone_from(description);
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(list_id) = self.todo_list_id {
            todo.todo_list_id = list_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn todo_uses_camel_case_list_id() {
        let todo = Todo::from_new(3, 1, NewTodo::new("write tests"));
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["todoListId"], json!(1));
        assert_eq!(value["status"], json!("todo"));
        assert_eq!(value["priority"], json!("medium"));
    }

    #[test]
    fn in_progress_wire_spelling() {
        let value = serde_json::to_value(TodoStatus::InProgress).unwrap();
        assert_eq!(value, json!("in progress"));

        let spaced: TodoStatus = serde_json::from_value(json!("in progress")).unwrap();
        let snake: TodoStatus = serde_json::from_value(json!("in_progress")).unwrap();
        assert_eq!(spaced, TodoStatus::InProgress);
        assert_eq!(snake, TodoStatus::InProgress);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<TodoStatus, _> = serde_json::from_value(json!("blocked"));
        assert!(result.is_err());
    }

    #[test]
    fn list_description_defaults_to_empty() {
        let list: TodoList = serde_json::from_value(json!({"id": 2, "title": "Home"})).unwrap();
        assert_eq!(list, TodoList::new(2, "Home", ""));
    }

    #[test]
    fn todo_patch_only_touches_present_fields() {
        let mut todo = Todo::from_new(
            1,
            1,
            NewTodo::new("a").with_description("keep me"),
        );
        let patch = TodoPatch {
            title: Some("b".into()),
            status: Some(TodoStatus::Done),
            ..TodoPatch::default()
        };
        patch.apply(&mut todo);

        assert_eq!(todo.title, "b");
        assert_eq!(todo.description, "keep me");
        assert_eq!(todo.status, TodoStatus::Done);
        assert_eq!(todo.priority, Priority::Medium);
        assert!(!patch.is_empty());
        assert!(TodoPatch::default().is_empty());
    }

    #[test]
    fn list_patch_serializes_only_present_fields() {
        let patch = TodoListPatch {
            title: Some("Work".into()),
            description: None,
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"title": "Work"}));

        let mut list = TodoList::new(1, "Old", "desc");
        patch.apply(&mut list);
        assert_eq!(list, TodoList::new(1, "Work", "desc"));
    }
}
