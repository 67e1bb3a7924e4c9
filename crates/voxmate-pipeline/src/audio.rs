//! Exclusive audio ownership.
//!
//! One clip plays at a time. [`AudioSlot`] holds a single permit; an
//! [`AudioLease`] owns both the permit and the clip, and dropping the lease
//! releases both on every exit path (success, playback error, unwind).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use voxmate_core::{VoxError, VoxResult};

/// A synthesized utterance ready to play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
}

impl AudioClip {
    /// Wrap synthesized bytes. An empty payload is not a clip.
    pub fn new(bytes: Vec<u8>) -> VoxResult<Self> {
        if bytes.is_empty() {
            return Err(VoxError::Payload("empty audio".into()));
        }
        Ok(AudioClip { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension guessed from the container magic. Defaults to `mp3`,
    /// which is what the speech backend serves.
    pub fn extension(&self) -> &'static str {
        match self.bytes.as_slice() {
            [b'R', b'I', b'F', b'F', ..] => "wav",
            [b'O', b'g', b'g', b'S', ..] => "ogg",
            [b'f', b'L', b'a', b'C', ..] => "flac",
            [0x1A, 0x45, 0xDF, 0xA3, ..] => "webm",
            _ => "mp3",
        }
    }
}

/// Plays a clip to completion.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Resolve once playback finished. Decode or device failures are
    /// `Playback` errors.
    async fn play(&self, clip: &AudioClip) -> VoxResult<()>;
}

/// The one playable audio resource.
#[derive(Clone, Debug)]
pub struct AudioSlot {
    permit: Arc<Semaphore>,
}

impl Default for AudioSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSlot {
    pub fn new() -> Self {
        AudioSlot {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Wait until the slot is free, then take it for `clip`.
    pub async fn acquire(&self, clip: AudioClip) -> VoxResult<AudioLease> {
        let permit = Arc::clone(&self.permit)
            .acquire_owned()
            .await
            .map_err(|_| VoxError::Playback("audio slot closed".into()))?;
        debug!(bytes = clip.len(), "audio slot acquired");
        Ok(AudioLease {
            clip,
            _permit: permit,
        })
    }

    /// Take the slot only if nobody holds it.
    pub fn try_acquire(&self, clip: AudioClip) -> Option<AudioLease> {
        let permit = Arc::clone(&self.permit).try_acquire_owned().ok()?;
        Some(AudioLease {
            clip,
            _permit: permit,
        })
    }

    pub fn is_free(&self) -> bool {
        self.permit.available_permits() == 1
    }
}

/// Exclusive right to play one clip.
#[derive(Debug)]
pub struct AudioLease {
    clip: AudioClip,
    _permit: OwnedSemaphorePermit,
}

impl AudioLease {
    pub fn clip(&self) -> &AudioClip {
        &self.clip
    }

    /// Play the clip, then release the slot whatever the result.
    pub async fn play(self, player: &dyn AudioPlayer) -> VoxResult<()> {
        let result = player.play(&self.clip).await;
        debug!(ok = result.is_ok(), "audio slot released");
        result
    }
}
