//! Todo CLI
//!
//! Command-line todo manager with optional "bring your own backend" sync.
//!
//! # Commands
//!
//! - `list` - Add, update, delete and select todo lists
//! - `todo` - Add, update and delete todos in the selected list
//! - `show` - Print the local store
//! - `config` - Edit the backend URL, headers and sync flags
//! - `pull` - Import records that exist only on the backend
//! - `push` - Send the whole local store to the backend
//! - `status` - Compare local and remote counts

mod commands;

use clap::{Parser, Subcommand};
use commands::{ConfigCommand, Context, ListCommand, TodoCommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Todo manager with BYOB sync.
#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the local store and configuration
    #[arg(global = true, short, long, env = "TODO_SYNC_DIR", default_value = ".todo-sync")]
    path: PathBuf,

    /// Network timeout in seconds
    #[arg(global = true, long, env = "TODO_SYNC_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage todo lists
    #[command(subcommand)]
    List(ListCommand),

    /// Manage todos in the selected list
    #[command(subcommand)]
    Todo(TodoCommand),

    /// Print the local store
    Show {
        /// Print the raw store as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or edit the sync configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Import records that exist only on the backend
    Pull,

    /// Send the whole local store to the backend
    Push {
        /// Push even if the backend appears to be ahead
        #[arg(short, long)]
        force: bool,
    },

    /// Compare local and remote counts
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::open(&cli.path, Duration::from_secs(cli.timeout))?;

    let result = match cli.command {
        Commands::List(command) => commands::list::run(&ctx, command),
        Commands::Todo(command) => commands::todo::run(&ctx, command),
        Commands::Show { json } => commands::show::run(&ctx, json),
        Commands::Config(command) => commands::config::run(&ctx, command),
        Commands::Pull => commands::sync::pull(&ctx).await,
        Commands::Push { force } => commands::sync::push(&ctx, force).await,
        Commands::Status => commands::sync::status(&ctx).await,
    };

    // Let publishes triggered by this command finish before exiting.
    ctx.engine.flush().await;

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(commands::exit_code(&*e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use todo_sync_protocol::Priority;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn priority_and_path_flags_are_distinct() {
        let cli = Cli::try_parse_from([
            "todo", "-p", "/tmp/todos", "todo", "add", "ship", "-P", "high",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("/tmp/todos"));
        match cli.command {
            Commands::Todo(TodoCommand::Add { priority, .. }) => {
                assert_eq!(priority, Some(Priority::High));
            }
            _ => panic!("expected todo add"),
        }
    }
}
