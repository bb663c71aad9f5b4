//! Show command implementation.

use super::{CommandResult, Context};
use todo_store::Store;

/// Prints the local store, as text or JSON.
pub fn run(ctx: &Context, json: bool) -> CommandResult {
    let store = ctx.store().snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&store)?);
    } else {
        print_text(&store);
    }
    Ok(())
}

fn print_text(store: &Store) {
    if store.todo_lists.is_empty() && store.todos.is_empty() {
        println!("No lists yet. Create one with `todo list add <title>`.");
        return;
    }

    for list in &store.todo_lists {
        let marker = if store.current_todo_list_id == Some(list.id) {
            "*"
        } else {
            " "
        };
        println!("{marker} [{}] {}", list.id, list.title);
        if !list.description.is_empty() {
            println!("      {}", list.description);
        }
        for todo in store.todos.iter().filter(|t| t.todo_list_id == list.id) {
            println!(
                "      {:>3}. [{}] ({}) {}",
                todo.id, todo.status, todo.priority, todo.title
            );
        }
    }

    let orphans: Vec<_> = store
        .todos
        .iter()
        .filter(|t| store.find_list(t.todo_list_id).is_none())
        .collect();
    if !orphans.is_empty() {
        println!("  (no list)");
        for todo in orphans {
            println!(
                "      {:>3}. [{}] ({}) {} -> list {}",
                todo.id, todo.status, todo.priority, todo.title, todo.todo_list_id
            );
        }
    }
}
