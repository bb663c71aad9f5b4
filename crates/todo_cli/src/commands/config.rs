//! Config command implementation.

use super::{CommandResult, Context};
use clap::Subcommand;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the backend URL
    SetUrl {
        /// Backend URL, used for GET and POST
        url: String,
    },

    /// Add or replace a request header
    AddHeader {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },

    /// Remove a request header
    RemoveHeader {
        /// Header name
        name: String,
    },

    /// Enable or disable BYOB sync (toggles when no value is given)
    Byob {
        /// `on` or `off`
        #[arg(value_parser = parse_switch)]
        state: Option<bool>,
    },

    /// Toggle the force-push default
    ForcePush,
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got {s:?}")),
    }
}

/// Runs a config subcommand.
pub fn run(ctx: &Context, command: ConfigCommand) -> CommandResult {
    let config = &ctx.config;
    match command {
        ConfigCommand::Show { json } => {
            let current = config.config();
            if json {
                println!("{}", serde_json::to_string_pretty(&current)?);
            } else {
                let url = if current.backend_url.is_empty() {
                    "(not set)"
                } else {
                    current.backend_url.as_str()
                };
                println!("Backend URL: {url}");
                println!("BYOB:        {}", on_off(current.byob_enabled));
                println!("Force push:  {}", on_off(current.force_push));
                println!("Headers:");
                for (name, value) in &current.headers {
                    println!("  {name}: {value}");
                }
                if !current.is_remote_enabled() {
                    println!("Remote sync is inactive.");
                }
            }
        }
        ConfigCommand::SetUrl { url } => {
            config.set_backend_url(url.trim())?;
            println!("Backend URL set");
        }
        ConfigCommand::AddHeader { name, value } => {
            config.add_header(name.trim(), value)?;
            println!("Header {} set", name.trim());
        }
        ConfigCommand::RemoveHeader { name } => {
            config.remove_header(&name)?;
            println!("Header {name} removed");
        }
        ConfigCommand::Byob { state } => {
            let enabled = match state {
                Some(enabled) => {
                    config.set_byob(enabled)?;
                    enabled
                }
                None => config.toggle_byob()?,
            };
            println!("BYOB {}", on_off(enabled));
        }
        ConfigCommand::ForcePush => {
            let force = config.toggle_force_push()?;
            println!("Force push {}", on_off(force));
        }
    }
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
