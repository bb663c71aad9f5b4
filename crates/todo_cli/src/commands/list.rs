//! List command implementation.

use super::{CommandResult, Context};
use clap::Subcommand;
use todo_sync_protocol::{NewTodoList, RecordId, TodoListPatch};

/// List subcommands.
#[derive(Subcommand)]
pub enum ListCommand {
    /// Create a list and select it
    Add {
        /// List title
        title: String,

        /// List description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Change a list's title or description
    Update {
        /// List id
        id: RecordId,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete an empty list
    Delete {
        /// List id
        id: RecordId,
    },

    /// Select the list new todos are added to
    Select {
        /// List id
        id: RecordId,
    },
}

/// Runs a list subcommand.
pub fn run(ctx: &Context, command: ListCommand) -> CommandResult {
    let store = ctx.store();
    match command {
        ListCommand::Add { title, description } => {
            let list = store.add_todo_list(NewTodoList::new(title, description))?;
            println!("Created list {} \"{}\" (selected)", list.id, list.title);
        }
        ListCommand::Update {
            id,
            title,
            description,
        } => {
            let patch = TodoListPatch { title, description };
            if patch.is_empty() {
                return Err("nothing to update: pass --title or --description".into());
            }
            let list = store.update_todo_list(id, patch)?;
            println!("Updated list {} \"{}\"", list.id, list.title);
        }
        ListCommand::Delete { id } => {
            store.delete_todo_list(id)?;
            println!("Deleted list {id}");
        }
        ListCommand::Select { id } => {
            store.set_active_list(id)?;
            println!("Selected list {id}");
        }
    }
    Ok(())
}
