//! Pull, push and status commands.

use super::{CommandResult, Context};
use todo_sync_engine::{PullOutcome, PushOutcome};

/// Imports remote-only records.
pub async fn pull(ctx: &Context) -> CommandResult {
    match ctx.engine.pull().await? {
        PullOutcome::Unavailable => {
            if !ctx.config.config().is_remote_enabled() {
                println!("Remote sync is off; enable it with `todo config byob on`.");
            } else {
                println!("Backend unavailable; nothing pulled.");
            }
        }
        PullOutcome::Merged(outcome) => {
            println!(
                "Pulled {} lists and {} todos",
                outcome.lists_added, outcome.todos_added
            );
            if outcome.dangling_todos > 0 {
                println!(
                    "{} pulled todos reference lists that do not exist",
                    outcome.dangling_todos
                );
            }
        }
    }
    Ok(())
}

/// Sends the whole local store.
pub async fn push(ctx: &Context, force: bool) -> CommandResult {
    // Without --force the configured default applies.
    let force = force.then_some(true);
    match ctx.engine.push(force).await? {
        PushOutcome::Pushed {
            todo_lists,
            todos,
            forced,
        } => {
            let suffix = if forced { " (forced)" } else { "" };
            println!("Pushed {todo_lists} lists and {todos} todos{suffix}");
        }
        PushOutcome::Skipped(eligibility) => {
            println!("Push skipped: the backend is not behind.");
            if eligibility.should_pull {
                println!("The backend has more data; run `todo pull` first or use --force.");
            }
        }
    }
    Ok(())
}

/// Prints local counts and, when reachable, the remote comparison.
pub async fn status(ctx: &Context) -> CommandResult {
    let (lists, todos) = ctx.store().counts();
    println!("Local:  {lists} lists, {todos} todos");

    if !ctx.config.config().is_remote_enabled() {
        println!("Remote: sync is off");
        return Ok(());
    }

    match ctx.engine.eligibility().await {
        Some(eligibility) => {
            let advice = match (eligibility.should_push, eligibility.should_pull) {
                (true, true) => "both sides have records the other lacks; pull, then push",
                (true, false) => "local is ahead; push",
                (false, true) => "remote is ahead; pull",
                (false, false) => "in step",
            };
            println!("Remote: {advice}");
        }
        None => println!("Remote: unavailable"),
    }
    Ok(())
}
