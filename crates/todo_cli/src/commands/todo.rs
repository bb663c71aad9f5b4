//! Todo command implementation.

use super::{parse_priority, parse_status, CommandResult, Context};
use clap::Subcommand;
use todo_sync_protocol::{NewTodo, Priority, RecordId, TodoPatch, TodoStatus};

/// Todo subcommands.
#[derive(Subcommand)]
pub enum TodoCommand {
    /// Add a todo to the selected list
    Add {
        /// Todo title
        title: String,

        /// Todo description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Status (backlog, todo, in-progress, done, canceled)
        #[arg(short, long, value_parser = parse_status)]
        status: Option<TodoStatus>,

        /// Priority (low, medium, high)
        #[arg(short = 'P', long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },

    /// Change fields of a todo
    Update {
        /// Todo id
        id: RecordId,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status
        #[arg(short, long, value_parser = parse_status)]
        status: Option<TodoStatus>,

        /// New priority
        #[arg(short = 'P', long, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// Move the todo to another list
        #[arg(short, long)]
        list: Option<RecordId>,
    },

    /// Delete a todo
    Delete {
        /// Todo id
        id: RecordId,
    },
}

/// Runs a todo subcommand.
pub fn run(ctx: &Context, command: TodoCommand) -> CommandResult {
    let store = ctx.store();
    match command {
        TodoCommand::Add {
            title,
            description,
            status,
            priority,
        } => {
            let new = NewTodo::new(title)
                .with_description(description)
                .with_status(status.unwrap_or_default())
                .with_priority(priority.unwrap_or_default());
            let todo = store.add_todo(new)?;
            println!(
                "Added todo {} to list {}: {}",
                todo.id, todo.todo_list_id, todo.title
            );
        }
        TodoCommand::Update {
            id,
            title,
            description,
            status,
            priority,
            list,
        } => {
            let patch = TodoPatch {
                title,
                description,
                status,
                priority,
                todo_list_id: list,
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            let todo = store.update_todo(id, patch)?;
            println!("Updated todo {} [{}] {}", todo.id, todo.status, todo.title);
        }
        TodoCommand::Delete { id } => {
            store.delete_todo(id)?;
            println!("Deleted todo {id}");
        }
    }
    Ok(())
}
