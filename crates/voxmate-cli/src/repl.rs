//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Lines starting with `/` are conversation commands; everything else is a
//! chat turn.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use voxmate_core::utils::get_history_path;
use voxmate_core::view::{render_history, render_transcript};
use voxmate_pipeline::{RejectReason, SendOutcome};

use crate::app::App;
use crate::helpers;
use crate::sessions_cmd::id_at;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

const HELP: &str = "\
  /new          start a new conversation
  /sessions     list conversations
  /switch N     switch to conversation N
  /delete N     delete conversation N
  /clear        clear the current conversation
  /history      show the current transcript
  exit          quit";

/// A parsed REPL line.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Exit,
    Help,
    New,
    Sessions,
    Switch(usize),
    Delete(usize),
    Clear,
    History,
    /// Unknown command or bad argument; carries the message to show.
    Invalid(String),
    Chat(&'a str),
}

pub fn parse_line(line: &str) -> Option<ReplCommand<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_exit_command(trimmed) {
        return Some(ReplCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Some(ReplCommand::Chat(trimmed));
    }

    let mut parts = trimmed.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    let position = |cmd: &str| -> Result<usize, String> {
        arg.and_then(|a| a.parse::<usize>().ok())
            .ok_or_else(|| format!("usage: {cmd} N"))
    };

    let command = match name.as_str() {
        "/help" | "/?" => ReplCommand::Help,
        "/new" => ReplCommand::New,
        "/sessions" | "/list" => ReplCommand::Sessions,
        "/clear" => ReplCommand::Clear,
        "/history" => ReplCommand::History,
        "/switch" => position("/switch").map_or_else(ReplCommand::Invalid, ReplCommand::Switch),
        "/delete" => position("/delete").map_or_else(ReplCommand::Invalid, ReplCommand::Delete),
        other => ReplCommand::Invalid(format!("unknown command {other}, try /help")),
    };
    Some(command)
}

/// Run the interactive REPL loop.
pub async fn run(app: &App) -> Result<()> {
    let title = app
        .sessions()
        .current()
        .map(|s| s.title.clone())
        .unwrap_or_default();
    helpers::print_banner(&title);

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let Some(command) = parse_line(&input) else {
            continue;
        };
        let _ = editor.add_history_entry(&input);

        match command {
            ReplCommand::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            ReplCommand::Chat(text) => chat_turn(app, text).await,
            other => run_command(app, other),
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// One chat turn, printing the reply.
pub async fn chat_turn(app: &App, text: &str) {
    debug!(chars = text.chars().count(), "processing input");
    match app.pipeline.send(text).await {
        SendOutcome::Replied { reply, .. } => helpers::print_response(&reply),
        // The console sink already showed the error notification.
        SendOutcome::Failed { .. } => {}
        SendOutcome::Rejected(RejectReason::Busy) => {
            eprintln!("{}", "Still working on the previous message.".yellow());
        }
        SendOutcome::Rejected(RejectReason::Empty) => {}
    }
}

fn run_command(app: &App, command: ReplCommand<'_>) {
    match command {
        ReplCommand::Help => println!("{}", HELP.dimmed()),
        ReplCommand::New => {
            app.sessions().create_session();
            println!("{}", "Started a new conversation.".green());
        }
        ReplCommand::Sessions => helpers::print_history(&render_history(app.sessions().sessions())),
        ReplCommand::Switch(position) => {
            let mut sessions = app.sessions();
            match id_at(&sessions, position) {
                Ok(id) => {
                    sessions.switch_session(&id);
                    helpers::print_transcript(&render_transcript(sessions.transcript()));
                }
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        }
        ReplCommand::Delete(position) => {
            let mut sessions = app.sessions();
            match id_at(&sessions, position) {
                Ok(id) => {
                    sessions.delete_session(&id);
                    println!("{}", "Conversation deleted.".green());
                }
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        }
        ReplCommand::Clear => {
            app.sessions().clear_current();
            println!("{}", "Conversation cleared.".green());
        }
        ReplCommand::History => {
            helpers::print_transcript(&render_transcript(app.sessions().transcript()));
        }
        ReplCommand::Invalid(message) => eprintln!("{}", message.yellow()),
        ReplCommand::Exit | ReplCommand::Chat(_) => {}
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
