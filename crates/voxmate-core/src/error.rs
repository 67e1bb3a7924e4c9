//! Error taxonomy shared by every Voxmate crate.
//!
//! Library code returns [`VoxResult`]; only the CLI binary wraps errors in
//! `anyhow`.

/// Everything that can go wrong while handling a turn or touching storage.
#[derive(Debug, thiserror::Error)]
pub enum VoxError {
    /// Input was empty or whitespace-only. Rejected silently.
    #[error("empty input")]
    Validation,

    /// Collaborator unreachable (connect, timeout, broken transport).
    #[error("network: {0}")]
    Network(String),

    /// Collaborator answered with a non-2xx status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Collaborator answered 2xx but the body was unusable.
    #[error("payload: {0}")]
    Payload(String),

    /// Audio could not be decoded or played.
    #[error("playback: {0}")]
    Playback(String),

    /// Storage unreadable, corrupt, or not writable.
    #[error("persistence: {0}")]
    Persistence(String),

    /// Invalid configuration or settings value.
    #[error("config: {0}")]
    Config(String),
}

impl VoxError {
    /// Short category label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VoxError::Validation => "validation",
            VoxError::Network(_) | VoxError::Status { .. } => "network",
            VoxError::Payload(_) => "payload",
            VoxError::Playback(_) => "playback",
            VoxError::Persistence(_) => "persistence",
            VoxError::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for VoxError {
    fn from(e: std::io::Error) -> Self {
        VoxError::Persistence(e.to_string())
    }
}

pub type VoxResult<T> = Result<T, VoxError>;
