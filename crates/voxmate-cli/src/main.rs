//! Voxmate CLI: entry point.
//!
//! # Commands
//!
//! - `voxmate chat [-m MESSAGE]`: talk to the assistant (single-shot or REPL)
//! - `voxmate listen FILE`: send a recorded question
//! - `voxmate sessions …`: list, switch, delete, export conversations
//! - `voxmate settings …`: show or edit settings
//! - `voxmate status`: configuration and backend health
//! - `voxmate preview TEXT`: show what would be spoken

mod app;
mod console;
mod helpers;
mod player;
mod repl;
mod sessions_cmd;
mod settings_cmd;
mod status;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use voxmate_core::config::load_config;
use voxmate_core::session::SessionStore;
use voxmate_pipeline::{RejectReason, SendOutcome};
use voxmate_providers::clean_for_speech;
use voxmate_providers::transcription::is_audio_file;

use crate::app::{App, AppOptions};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🎙 Voxmate: voice chat assistant in your terminal
#[derive(Parser)]
#[command(name = "voxmate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Don't speak replies this run
        #[arg(long, default_value_t = false)]
        no_speech: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Transcribe a recorded question and answer it
    Listen {
        /// Audio file (wav, mp3, ogg, webm, ...)
        file: String,

        /// Don't speak the reply
        #[arg(long, default_value_t = false)]
        no_speech: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Manage conversations
    Sessions {
        #[command(subcommand)]
        action: sessions_cmd::SessionsCommands,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: settings_cmd::SettingsCommands,
    },

    /// Show configuration, backend and settings status
    Status,

    /// Show how a reply would be cleaned up before it is spoken
    Preview {
        /// Text to clean
        text: String,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            no_speech,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, AppOptions { no_speech, logs }).await
        }
        Commands::Listen {
            file,
            no_speech,
            logs,
        } => {
            init_logging(logs);
            run_listen(&file, AppOptions { no_speech, logs }).await
        }
        Commands::Sessions { action } => {
            init_logging(false);
            let app = App::open(AppOptions::default())?;
            sessions_cmd::dispatch(&app, action)
        }
        Commands::Settings { action } => {
            init_logging(false);
            let config = load_config(None);
            let store = SessionStore::new(config.storage.data_path());
            settings_cmd::dispatch(&store, action)
        }
        Commands::Status => {
            init_logging(false);
            status::run().await
        }
        Commands::Preview { text } => {
            println!("{}", clean_for_speech(&text));
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────
// Chat & listen
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, options: AppOptions) -> Result<()> {
    let app = App::open(options)?;

    match message {
        Some(msg) => {
            info!("processing single message");
            match app.pipeline.send(&msg).await {
                SendOutcome::Replied { reply, .. } => helpers::print_response(&reply),
                SendOutcome::Failed { reason } => bail!("chat failed: {reason}"),
                SendOutcome::Rejected(RejectReason::Empty) => bail!("message is empty"),
                SendOutcome::Rejected(RejectReason::Busy) => bail!("another message is in flight"),
            }
        }
        None => repl::run(&app).await?,
    }

    Ok(())
}

async fn run_listen(file: &str, options: AppOptions) -> Result<()> {
    let path = helpers::expand_tilde(file);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.wav".to_string());
    if !is_audio_file(&name) {
        bail!("{} does not look like an audio file", path.display());
    }
    let audio = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let app = App::open(options)?;
    if app.settings().asr_engine == "browser" {
        eprintln!(
            "{}",
            "Note: the 'browser' recognition engine only works in the web client; \
             run `voxmate settings set asrEngine whisper`."
                .yellow()
        );
    }

    match app.pipeline.send_voice(&audio, &name).await {
        SendOutcome::Replied { reply, .. } => {
            let question = app
                .sessions()
                .transcript()
                .iter()
                .rev()
                .nth(1)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            println!("{} {}", "You said:".dimmed(), question);
            helpers::print_response(&reply);
            Ok(())
        }
        SendOutcome::Rejected(RejectReason::Empty) => bail!("no speech recognized"),
        SendOutcome::Rejected(RejectReason::Busy) => bail!("another message is in flight"),
        SendOutcome::Failed { reason } => bail!("listen failed: {reason}"),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("voxmate=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sessions_switch() {
        let cli = Cli::try_parse_from(["voxmate", "sessions", "switch", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                action: sessions_cmd::SessionsCommands::Switch { position: 2 }
            }
        ));
    }

    #[test]
    fn parses_chat_flags() {
        let cli = Cli::try_parse_from(["voxmate", "chat", "-m", "hi", "--no-speech"]).unwrap();
        match cli.command {
            Commands::Chat {
                message, no_speech, ..
            } => {
                assert_eq!(message.as_deref(), Some("hi"));
                assert!(no_speech);
            }
            _ => panic!("Expected chat"),
        }
    }
}
