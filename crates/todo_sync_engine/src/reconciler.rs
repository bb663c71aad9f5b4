//! Additive reconciliation of a remote snapshot into the local store.
//!
//! ```text
//! diff(local, remote)  = { r in remote : r.id not in ids(local) }
//! merge(local, remote) = local ++ diff(local, remote)
//! ```
//!
//! Applied to lists first, then todos. Nothing local is ever removed or
//! overwritten; id collisions are settled by [`MergePolicy`].

use std::collections::HashSet;
use todo_store::{KeyValueBackend, LocalStore, Store, StoreResult};
use todo_sync_protocol::{
    Identified, MergePolicy, RecordId, RemoteSnapshot, Resolution, Todo, TodoList, MERGE_POLICY,
};
use tracing::debug;

/// Remote records whose id is absent locally, in remote order.
///
/// A remote collection that repeats an id contributes its first occurrence
/// only.
pub fn diff<T: Identified + Clone>(local: &[T], remote: &[T]) -> Vec<T> {
    let mut seen: HashSet<RecordId> = local.iter().map(Identified::id).collect();
    remote
        .iter()
        .filter(|r| seen.insert(r.id()))
        .cloned()
        .collect()
}

/// `local` followed by [`diff`] of `remote`.
pub fn merge<T: Identified + Clone>(local: &[T], remote: &[T]) -> Vec<T> {
    let mut merged = local.to_vec();
    merged.extend(diff(local, remote));
    merged
}

/// What a pull would import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Remote-only lists.
    pub todo_lists: Vec<TodoList>,
    /// Remote-only todos.
    pub todos: Vec<Todo>,
    /// Imported todos whose list exists neither locally nor in the import.
    pub dangling_todos: usize,
    /// Remote records whose id already existed locally.
    pub collisions: usize,
}

impl ReconcilePlan {
    /// Returns true if nothing would be imported.
    pub fn is_empty(&self) -> bool {
        self.todo_lists.is_empty() && self.todos.is_empty()
    }
}

/// What a pull imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Lists appended to the store.
    pub lists_added: usize,
    /// Todos appended to the store.
    pub todos_added: usize,
    /// Imported todos referencing a list that does not exist.
    pub dangling_todos: usize,
    /// Remote records skipped because the id existed locally.
    pub collisions: usize,
}

impl ReconcileOutcome {
    /// Total records imported.
    pub fn records_added(&self) -> usize {
        self.lists_added + self.todos_added
    }
}

/// Plans and applies merges under a [`MergePolicy`].
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    policy: MergePolicy,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(MERGE_POLICY)
    }
}

impl Reconciler {
    /// Creates a reconciler with `policy`.
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    /// Computes what merging `remote` into `local` would import.
    pub fn plan(&self, local: &Store, remote: &RemoteSnapshot) -> ReconcilePlan {
        let mut collisions = self.count_collisions(&local.todo_lists, &remote.todo_lists);
        collisions += self.count_collisions(&local.todos, &remote.todos);

        let todo_lists = diff(&local.todo_lists, &remote.todo_lists);
        let todos = diff(&local.todos, &remote.todos);

        let known_lists: HashSet<RecordId> = local
            .todo_lists
            .iter()
            .chain(&todo_lists)
            .map(|l| l.id)
            .collect();
        let dangling_todos = todos
            .iter()
            .filter(|t| !known_lists.contains(&t.todo_list_id))
            .inspect(|t| {
                debug!(
                    todo = t.id,
                    list = t.todo_list_id,
                    "importing todo whose list does not exist"
                )
            })
            .count();

        ReconcilePlan {
            todo_lists,
            todos,
            dangling_todos,
            collisions,
        }
    }

    /// Merges `remote` into `store` with a single persisted write.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written; the store is then
    /// unchanged.
    pub fn apply<B: KeyValueBackend>(
        &self,
        store: &LocalStore<B>,
        remote: &RemoteSnapshot,
    ) -> StoreResult<ReconcileOutcome> {
        let plan = self.plan(&store.snapshot(), remote);
        if plan.is_empty() {
            return Ok(ReconcileOutcome {
                collisions: plan.collisions,
                ..ReconcileOutcome::default()
            });
        }
        let (lists_added, todos_added) = store.append_remote(plan.todo_lists, plan.todos)?;
        Ok(ReconcileOutcome {
            lists_added,
            todos_added,
            dangling_todos: plan.dangling_todos,
            collisions: plan.collisions,
        })
    }

    fn count_collisions<T: Identified>(&self, local: &[T], remote: &[T]) -> usize {
        remote
            .iter()
            .filter_map(|r| local.iter().find(|l| l.id() == r.id()).map(|l| (l, r)))
            .filter(|(l, r)| match self.policy.resolve(*l, *r) {
                Resolution::KeepLocal => true,
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use todo_store::InMemoryBackend;
    use todo_sync_protocol::{NewTodo, NewTodoList};

    fn todo(id: RecordId, list: RecordId) -> Todo {
        Todo::from_new(id, list, NewTodo::new(format!("todo {id}")))
    }

    fn ids<T: Identified>(records: &[T]) -> Vec<RecordId> {
        records.iter().map(Identified::id).collect()
    }

    #[test]
    fn diff_and_merge_example() {
        let local = vec![todo(1, 1), todo(2, 1)];
        let remote = vec![todo(2, 1), todo(3, 1)];

        assert_eq!(ids(&diff(&local, &remote)), vec![3]);
        assert_eq!(ids(&merge(&local, &remote)), vec![1, 2, 3]);
    }

    #[test]
    fn local_copy_wins_on_collision() {
        let local = vec![TodoList::new(1, "Local", "")];
        let remote = vec![TodoList::new(1, "Remote", "")];

        let merged = merge(&local, &remote);
        assert_eq!(merged, local);
    }

    #[test]
    fn duplicate_remote_ids_import_once() {
        let remote = vec![todo(4, 1), todo(4, 2), todo(5, 1)];
        let imported = diff(&[], &remote);
        assert_eq!(ids(&imported), vec![4, 5]);
        assert_eq!(imported[0].todo_list_id, 1);
    }

    #[test]
    fn plan_counts_dangling_and_collisions() {
        let local = Store {
            current_todo_list_id: Some(1),
            todo_lists: vec![TodoList::new(1, "Work", "")],
            todos: vec![todo(1, 1)],
        };
        let remote = RemoteSnapshot::new(
            vec![TodoList::new(1, "Work (remote)", ""), TodoList::new(2, "Home", "")],
            vec![todo(1, 1), todo(2, 2), todo(3, 9)],
        );

        let plan = Reconciler::default().plan(&local, &remote);
        assert_eq!(ids(&plan.todo_lists), vec![2]);
        assert_eq!(ids(&plan.todos), vec![2, 3]);
        assert_eq!(plan.dangling_todos, 1);
        assert_eq!(plan.collisions, 2);
    }

    #[test]
    fn apply_imports_and_is_idempotent() {
        let store = LocalStore::open(InMemoryBackend::new()).unwrap();
        store.add_todo_list(NewTodoList::new("Work", "")).unwrap();
        store.add_todo(NewTodo::new("local")).unwrap();

        let remote = RemoteSnapshot::new(
            vec![TodoList::new(2, "Home", "")],
            vec![todo(1, 1), todo(7, 2)],
        );
        let reconciler = Reconciler::default();

        let first = reconciler.apply(&store, &remote).unwrap();
        assert_eq!((first.lists_added, first.todos_added), (1, 1));
        assert_eq!(store.todos()[0].title, "local");

        let writes = store.backend().write_count();
        let second = reconciler.apply(&store, &remote).unwrap();
        assert_eq!(second.records_added(), 0);
        assert_eq!(store.backend().write_count(), writes);
    }

    fn todos_strategy() -> impl Strategy<Value = Vec<Todo>> {
        prop::collection::vec((0i64..40, 0i64..5), 0..30)
            .prop_map(|pairs| pairs.into_iter().map(|(id, list)| todo(id, list)).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn diff_is_remote_subset_disjoint_from_local(
            local in todos_strategy(),
            remote in todos_strategy(),
        ) {
            let imported = diff(&local, &remote);
            let local_ids: HashSet<_> = ids(&local).into_iter().collect();

            for record in &imported {
                prop_assert!(remote.contains(record));
                prop_assert!(!local_ids.contains(&record.id));
            }
        }

        #[test]
        fn merge_keeps_local_prefix_and_is_idempotent(
            local in todos_strategy(),
            remote in todos_strategy(),
        ) {
            let merged = merge(&local, &remote);
            prop_assert_eq!(&merged[..local.len()], &local[..]);
            prop_assert!(diff(&merged, &remote).is_empty());
        }
    }
}
