//! The local todo store.

use crate::backend::KeyValueBackend;
use crate::error::{StoreError, StoreResult};
use crate::record::{load_record, save_record, Record};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use todo_sync_protocol::{
    IdPayload, NewTodo, NewTodoList, RecordId, RecordKind, SyncEvent, SyncPayload, Todo,
    TodoList, TodoListPatch, TodoListUpdate, TodoPatch, TodoPayload,
};
use tracing::debug;

/// Storage key of the [`Store`] record.
pub const STORE_KEY: &str = "store";

/// The persisted todo aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    /// The selected list; new todos are added to it.
    #[serde(default)]
    pub current_todo_list_id: Option<RecordId>,
    /// Lists in insertion order.
    #[serde(default)]
    pub todo_lists: Vec<TodoList>,
    /// Todos in insertion order.
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl Store {
    /// Finds a list by id.
    pub fn find_list(&self, id: RecordId) -> Option<&TodoList> {
        self.todo_lists.iter().find(|l| l.id == id)
    }

    /// Finds a todo by id.
    pub fn find_todo(&self, id: RecordId) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Number of todos that reference `list_id`.
    pub fn todos_in_list(&self, list_id: RecordId) -> usize {
        self.todos
            .iter()
            .filter(|t| t.todo_list_id == list_id)
            .count()
    }

    /// Builds the payload of a bulk `sync` push.
    pub fn to_sync_payload(&self, force: bool) -> SyncPayload {
        SyncPayload {
            todos: self.todos.clone(),
            todo_lists: self.todo_lists.clone(),
            force,
        }
    }

    fn next_list_id(&self) -> StoreResult<RecordId> {
        let max = self.todo_lists.iter().map(|l| l.id).max().unwrap_or(0);
        max.checked_add(1)
            .ok_or(StoreError::IdsExhausted(RecordKind::TodoList))
    }

    // New todos take count + 1. After deletes or pulls that id may already be
    // taken, in which case the next id above the maximum is used instead.
    fn next_todo_id(&self) -> StoreResult<RecordId> {
        let candidate = self.todos.len() as RecordId + 1;
        if self.find_todo(candidate).is_none() {
            return Ok(candidate);
        }
        let max = self.todos.iter().map(|t| t.id).max().unwrap_or(0);
        max.checked_add(1)
            .ok_or(StoreError::IdsExhausted(RecordKind::Todo))
    }

    fn list_or_placeholder(&self, id: RecordId) -> TodoList {
        self.find_list(id)
            .cloned()
            .unwrap_or_else(TodoList::placeholder)
    }
}

impl Record for Store {
    const KEY: &'static str = STORE_KEY;

    fn migrate(from_version: u32, mut data: Value) -> StoreResult<Value> {
        if from_version != 0 {
            return Ok(data);
        }
        let obj = data
            .as_object_mut()
            .ok_or_else(|| StoreError::Corrupted("store record is not an object".into()))?;

        // Unversioned records keep lists under `todoList`, carry a UI-only
        // `jsonView` flag and use 0 for "no list selected".
        if let Some(lists) = obj.remove("todoList") {
            obj.entry("todoLists").or_insert(lists);
        }
        obj.remove("jsonView");

        let current_is_zero = obj.get("currentTodoListId").and_then(Value::as_i64) == Some(0);
        let has_list_zero = obj
            .get("todoLists")
            .and_then(Value::as_array)
            .is_some_and(|lists| {
                lists
                    .iter()
                    .any(|l| l.get("id").and_then(Value::as_i64) == Some(0))
            });
        if current_is_zero && !has_list_zero {
            obj.insert("currentTodoListId".into(), Value::Null);
        }
        Ok(data)
    }
}

/// Receives an event after every accepted local mutation.
///
/// Implementations must not block: the event is handed over after the
/// mutation is committed, on the mutating thread.
pub trait Outbox: Send + Sync {
    /// Publishes one event. Failures are the implementation's to report.
    fn publish(&self, event: SyncEvent);
}

/// The canonical local store.
///
/// All mutation passes through this type. Each operation validates against
/// the current state, builds the next state, persists it, and only then
/// makes it visible and hands the matching [`SyncEvent`] to the outbox.
/// A rejected or failed operation leaves memory and storage unchanged.
pub struct LocalStore<B: KeyValueBackend> {
    backend: B,
    state: RwLock<Store>,
    outbox: RwLock<Option<Arc<dyn Outbox>>>,
}

impl<B: KeyValueBackend> LocalStore<B> {
    /// Opens the store, loading the persisted record or starting empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be read.
    pub fn open(backend: B) -> StoreResult<Self> {
        let state = load_record::<Store, _>(&backend)?.unwrap_or_default();
        debug!(
            lists = state.todo_lists.len(),
            todos = state.todos.len(),
            "opened local store"
        );
        Ok(Self {
            backend,
            state: RwLock::new(state),
            outbox: RwLock::new(None),
        })
    }

    /// Attaches the outbox that receives mutation events.
    pub fn set_outbox(&self, outbox: Arc<dyn Outbox>) {
        *self.outbox.write() = Some(outbox);
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a copy of the whole aggregate.
    pub fn snapshot(&self) -> Store {
        self.state.read().clone()
    }

    /// Returns all todos.
    pub fn todos(&self) -> Vec<Todo> {
        self.state.read().todos.clone()
    }

    /// Returns all lists.
    pub fn todo_lists(&self) -> Vec<TodoList> {
        self.state.read().todo_lists.clone()
    }

    /// Returns the selected list id.
    pub fn current_todo_list_id(&self) -> Option<RecordId> {
        self.state.read().current_todo_list_id
    }

    /// Returns `(todo_lists, todos)` counts.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.read();
        (state.todo_lists.len(), state.todos.len())
    }

    /// Creates a list with the next id and selects it.
    pub fn add_todo_list(&self, new: NewTodoList) -> StoreResult<TodoList> {
        let list = self.commit(|store| {
            let list = TodoList::new(store.next_list_id()?, new.title, new.description);
            store.todo_lists.push(list.clone());
            store.current_todo_list_id = Some(list.id);
            Ok(list)
        })?;
        self.emit(SyncEvent::AddTodoList(list.clone()));
        Ok(list)
    }

    /// Applies `patch` to the list `id`.
    pub fn update_todo_list(&self, id: RecordId, patch: TodoListPatch) -> StoreResult<TodoList> {
        let list = self.commit(|store| {
            let list = store
                .todo_lists
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or_else(|| StoreError::not_found(RecordKind::TodoList, id))?;
            patch.apply(list);
            Ok(list.clone())
        })?;
        self.emit(SyncEvent::UpdateTodoList(TodoListUpdate { id, patch }));
        Ok(list)
    }

    /// Deletes the list `id` and clears the selection.
    ///
    /// Fails with [`StoreError::ReferentialIntegrity`] while any todo
    /// references the list. Deleting an absent list succeeds.
    pub fn delete_todo_list(&self, id: RecordId) -> StoreResult<()> {
        self.commit(|store| {
            let todo_count = store.todos_in_list(id);
            if todo_count > 0 {
                return Err(StoreError::ReferentialIntegrity {
                    list_id: id,
                    todo_count,
                });
            }
            store.todo_lists.retain(|l| l.id != id);
            store.current_todo_list_id = None;
            Ok(())
        })?;
        self.emit(SyncEvent::DeleteTodoList(IdPayload { id }));
        Ok(())
    }

    /// Adds a todo to the selected list.
    ///
    /// Fails with [`StoreError::NoActiveList`] when no list is selected.
    pub fn add_todo(&self, new: NewTodo) -> StoreResult<Todo> {
        let (todo, list) = self.commit(|store| {
            let list_id = store.current_todo_list_id.ok_or(StoreError::NoActiveList)?;
            let todo = Todo::from_new(store.next_todo_id()?, list_id, new);
            store.todos.push(todo.clone());
            Ok((todo, store.list_or_placeholder(list_id)))
        })?;
        self.emit(SyncEvent::AddTodo(TodoPayload {
            list,
            todo: todo.clone(),
        }));
        Ok(todo)
    }

    /// Applies `patch` to the todo `id`.
    ///
    /// Moving the todo to a list that does not exist fails with
    /// [`StoreError::NotFound`].
    pub fn update_todo(&self, id: RecordId, patch: TodoPatch) -> StoreResult<Todo> {
        let (todo, list) = self.commit(|store| {
            if let Some(list_id) = patch.todo_list_id {
                if store.find_list(list_id).is_none() {
                    return Err(StoreError::not_found(RecordKind::TodoList, list_id));
                }
            }
            let todo = store
                .todos
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::not_found(RecordKind::Todo, id))?;
            patch.apply(todo);
            let todo = todo.clone();
            let list = store.list_or_placeholder(todo.todo_list_id);
            Ok((todo, list))
        })?;
        self.emit(SyncEvent::UpdateTodo(TodoPayload {
            list,
            todo: todo.clone(),
        }));
        Ok(todo)
    }

    /// Deletes the todo `id`. Deleting an absent todo succeeds.
    pub fn delete_todo(&self, id: RecordId) -> StoreResult<()> {
        self.commit(|store| {
            store.todos.retain(|t| t.id != id);
            Ok(())
        })?;
        self.emit(SyncEvent::DeleteTodo(IdPayload { id }));
        Ok(())
    }

    /// Selects the list `id`. No event is published.
    pub fn set_active_list(&self, id: RecordId) -> StoreResult<()> {
        self.commit(|store| {
            if store.find_list(id).is_none() {
                return Err(StoreError::not_found(RecordKind::TodoList, id));
            }
            store.current_todo_list_id = Some(id);
            Ok(())
        })
    }

    /// Appends records imported from a remote in one write.
    ///
    /// Callers pass only records whose ids are not present locally; records
    /// whose id already exists are skipped so ids stay unique. No event is
    /// published. Returns `(lists_added, todos_added)`.
    pub fn append_remote(
        &self,
        todo_lists: Vec<TodoList>,
        todos: Vec<Todo>,
    ) -> StoreResult<(usize, usize)> {
        if todo_lists.is_empty() && todos.is_empty() {
            return Ok((0, 0));
        }
        self.commit(|store| {
            let mut lists_added = 0;
            for list in todo_lists {
                if store.find_list(list.id).is_none() {
                    store.todo_lists.push(list);
                    lists_added += 1;
                }
            }
            let mut todos_added = 0;
            for todo in todos {
                if store.find_todo(todo.id).is_none() {
                    store.todos.push(todo);
                    todos_added += 1;
                }
            }
            Ok((lists_added, todos_added))
        })
    }

    fn commit<R>(&self, mutate: impl FnOnce(&mut Store) -> StoreResult<R>) -> StoreResult<R> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let result = mutate(&mut next)?;
        save_record(&self.backend, &next)?;
        *state = next;
        Ok(result)
    }

    fn emit(&self, event: SyncEvent) {
        let outbox = self.outbox.read().clone();
        if let Some(outbox) = outbox {
            outbox.publish(event);
        }
    }
}
