//! Shared CLI helpers: path expansion, transcript and history printing,
//! version banner.

use std::path::PathBuf;

use colored::Colorize;

use voxmate_core::types::Role;
use voxmate_core::utils::single_line;
use voxmate_core::view::{HistoryEntry, TranscriptLine};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print an assistant reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "🎙 Voxmate".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(session_title: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🎙 Voxmate".cyan().bold(), version.dimmed());
    println!("{} {}", "Conversation:".dimmed(), session_title);
    println!(
        "{}",
        "Type a message, /help for commands, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// One history row, numbered from 1.
pub fn format_history_entry(index: usize, entry: &HistoryEntry) -> String {
    let marker = if entry.active { "▶" } else { " " };
    format!(
        "{marker} {:>2}. {:<24} {:>3} msgs  {}",
        index + 1,
        entry.title,
        entry.message_count,
        entry.time_label
    )
}

pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("{}", "(no conversations)".dimmed());
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        let row = format_history_entry(i, entry);
        if entry.active {
            println!("{}", row.bold());
        } else {
            println!("{row}");
        }
    }
}

pub fn print_transcript(lines: &[TranscriptLine]) {
    if lines.is_empty() {
        println!("{}", "(empty conversation)".dimmed());
        return;
    }
    for line in lines {
        let who = match line.role {
            Role::User => "You".green().bold(),
            Role::Assistant => "Voxmate".cyan().bold(),
        };
        println!("{} {} {}", line.time_label.dimmed(), who, single_line(&line.content));
    }
}

/// Turn a 1-based list position into an index, if it is in range.
pub fn resolve_position(position: usize, len: usize) -> Option<usize> {
    (1..=len).contains(&position).then(|| position - 1)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
