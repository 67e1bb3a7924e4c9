//! Audio playback through an external player command.
//!
//! The clip is written to a temp file that lives only for the duration of
//! one `play` call, then handed to the player as its last argument.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use voxmate_core::{VoxError, VoxResult};
use voxmate_pipeline::{AudioClip, AudioPlayer};

/// Longest a single utterance may play before it is abandoned.
const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Players tried in order when none is configured.
const CANDIDATES: &[&str] = &[
    "mpv --no-video --really-quiet",
    "ffplay -nodisp -autoexit -loglevel quiet",
    "afplay",
    "paplay",
    "aplay -q",
];

#[derive(Clone, Debug)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Use `command` if given, else the first installed candidate.
    pub fn resolve(command: Option<&str>) -> Option<Self> {
        match command {
            Some(cmd) => Self::parse(cmd),
            None => {
                let path = std::env::var_os("PATH")?;
                let found = detect(&path)?;
                info!(player = %found.program, "detected audio player");
                Some(found)
            }
        }
    }

    /// Split a command line on whitespace. `None` if it is blank.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(CommandPlayer {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// First candidate whose program exists on `path`.
fn detect(path: &OsStr) -> Option<CommandPlayer> {
    CANDIDATES
        .iter()
        .filter_map(|c| CommandPlayer::parse(c))
        .find(|p| find_on_path(&p.program, path).is_some())
}

fn find_on_path(program: &str, path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

fn write_clip(clip: &AudioClip) -> VoxResult<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("voxmate-")
        .suffix(&format!(".{}", clip.extension()))
        .tempfile()
        .map_err(|e| VoxError::Playback(format!("cannot create temp file: {e}")))?;
    file.write_all(clip.bytes())
        .and_then(|_| file.flush())
        .map_err(|e| VoxError::Playback(format!("cannot write temp file: {e}")))?;
    Ok(file)
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, clip: &AudioClip) -> VoxResult<()> {
        let file = write_clip(clip)?;
        debug!(player = %self.program, file = %file.path().display(), bytes = clip.len(), "playing clip");

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VoxError::Playback(format!("failed to start {}: {e}", self.program)))?;

        let output = tokio::time::timeout(PLAYBACK_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| VoxError::Playback("playback timed out".into()))?
            .map_err(|e| VoxError::Playback(e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(player = %self.program, status = %output.status, "player exited with an error");
            Err(VoxError::Playback(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// Used when no player is installed: every clip fails to play.
#[derive(Clone, Copy, Debug, Default)]
pub struct MissingPlayer;

#[async_trait]
impl AudioPlayer for MissingPlayer {
    async fn play(&self, _clip: &AudioClip) -> VoxResult<()> {
        Err(VoxError::Playback(
            "no audio player found; set playback.command in config.json".into(),
        ))
    }
}
