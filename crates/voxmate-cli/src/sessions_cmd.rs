//! `voxmate sessions`: manage saved conversations from the CLI.
//!
//! - `voxmate sessions list`: list conversations, newest first
//! - `voxmate sessions new`: start a new conversation
//! - `voxmate sessions switch <N>`: make conversation N current
//! - `voxmate sessions delete <N>`: delete conversation N
//! - `voxmate sessions clear`: empty the current conversation
//! - `voxmate sessions export [-o FILE]`: dump everything as JSON

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;

use voxmate_core::session::SessionManager;
use voxmate_core::types::SessionId;
use voxmate_core::view::{render_history, render_transcript};

use crate::app::App;
use crate::helpers;

/// Sessions subcommands.
#[derive(Subcommand)]
pub enum SessionsCommands {
    /// List conversations (▶ marks the current one)
    List,

    /// Start a new conversation
    New,

    /// Switch to conversation N (as numbered by `list`)
    Switch { position: usize },

    /// Delete conversation N (as numbered by `list`)
    Delete { position: usize },

    /// Clear the current conversation's messages
    Clear,

    /// Show the current conversation's transcript
    Show,

    /// Export all conversations and settings as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

pub fn dispatch(app: &App, cmd: SessionsCommands) -> Result<()> {
    match cmd {
        SessionsCommands::List => {
            helpers::print_history(&render_history(app.sessions().sessions()));
        }
        SessionsCommands::New => {
            let id = app.sessions().create_session();
            println!("{} Started conversation {}", "✓".green(), id.as_str().dimmed());
        }
        SessionsCommands::Switch { position } => {
            let mut sessions = app.sessions();
            let id = id_at(&sessions, position)?;
            sessions.switch_session(&id);
            let title = sessions.current().map(|s| s.title.clone()).unwrap_or_default();
            println!("{} Switched to \"{}\"", "✓".green(), title);
        }
        SessionsCommands::Delete { position } => {
            let mut sessions = app.sessions();
            let id = id_at(&sessions, position)?;
            let title = sessions.get(&id).map(|s| s.title.clone()).unwrap_or_default();
            sessions.delete_session(&id);
            println!("{} Deleted \"{}\"", "✓".green(), title);
        }
        SessionsCommands::Clear => {
            app.sessions().clear_current();
            println!("{} Conversation cleared", "✓".green());
        }
        SessionsCommands::Show => {
            helpers::print_transcript(&render_transcript(app.sessions().transcript()));
        }
        SessionsCommands::Export { output } => {
            let json = {
                let sessions = app.sessions();
                app.store
                    .export(sessions.sessions(), &app.settings())
                    .context("export failed")?
            };
            match output {
                Some(path) => {
                    let path: PathBuf = helpers::expand_tilde(&path);
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{} Exported to {}", "✓".green(), path.display());
                }
                None => println!("{json}"),
            }
        }
    }
    Ok(())
}

/// Id of the conversation at 1-based `position` in the history list.
pub fn id_at(sessions: &SessionManager, position: usize) -> Result<SessionId> {
    let list = sessions.sessions();
    match helpers::resolve_position(position, list.len()) {
        Some(idx) => Ok(list[idx].id.clone()),
        None => bail!(
            "no conversation #{position} (there are {})",
            list.len()
        ),
    }
}
