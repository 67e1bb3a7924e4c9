//! Message pipeline: one user turn from text to spoken reply.
//!
//! ```text
//! IDLE → SENDING → RESPONDED → SPEAKING → IDLE
//!           │                     │
//!           └→ LLM_ERROR → IDLE   └→ TTS_ERROR → IDLE
//! ```
//!
//! Only one turn runs at a time; a `send` while another is in flight is
//! rejected as busy. Session and settings locks are never held across an
//! await.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use voxmate_core::events::{EventSink, Severity, ViewEvent};
use voxmate_core::session::SessionManager;
use voxmate_core::settings::Settings;
use voxmate_core::status::{IndicatorState, Service, StatusTracker};
use voxmate_core::types::{ChatRequest, Role, SessionId, SpeechRequest, TranscriptionRequest};
use voxmate_core::VoxResult;
use voxmate_providers::traits::{ChatProvider, SpeechSynthesizer};
use voxmate_providers::transcription::TranscriptionProvider;

use crate::audio::{AudioClip, AudioPlayer, AudioSlot};

/// Assistant message recorded when the chat request fails.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong while processing your request.";

/// Replies shorter than this (after trimming) are not spoken.
pub const MIN_SPOKEN_CHARS: usize = 2;

// ─────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Idle,
    Sending,
    Responded,
    Speaking,
    LlmError,
    TtsError,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Sending => "sending",
            PipelineState::Responded => "responded",
            PipelineState::Speaking => "speaking",
            PipelineState::LlmError => "llm_error",
            PipelineState::TtsError => "tts_error",
        };
        f.write_str(s)
    }
}

/// Why a send never started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing but whitespace.
    Empty,
    /// Another turn is still in flight.
    Busy,
}

/// What happened to the spoken half of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Speech is turned off in settings.
    Disabled,
    /// Reply too short to be worth speaking.
    Skipped,
    Played,
    Failed,
}

/// Result of one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Rejected(RejectReason),
    Replied { reply: String, speech: SpeechOutcome },
    /// The fallback reply was recorded instead.
    Failed { reason: String },
}

// ─────────────────────────────────────────────
// Collaborators
// ─────────────────────────────────────────────

/// Everything the pipeline calls but does not own.
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Arc<dyn ChatProvider>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Option<Arc<dyn TranscriptionProvider>>,
    pub player: Arc<dyn AudioPlayer>,
}

/// Marks a turn as in flight until dropped.
struct TurnGuard<'a>(&'a AtomicBool);

impl<'a> TurnGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TurnGuard(flag))
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ─────────────────────────────────────────────
// MessagePipeline
// ─────────────────────────────────────────────

pub struct MessagePipeline {
    sessions: Arc<Mutex<SessionManager>>,
    settings: Arc<RwLock<Settings>>,
    status: StatusTracker,
    collaborators: Collaborators,
    audio: AudioSlot,
    sink: Arc<dyn EventSink>,
    state: Mutex<PipelineState>,
    in_flight: AtomicBool,
}

impl MessagePipeline {
    pub fn new(
        sessions: Arc<Mutex<SessionManager>>,
        settings: Arc<RwLock<Settings>>,
        status: StatusTracker,
        collaborators: Collaborators,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        info!(chat = collaborators.chat.display_name(), speech = collaborators.speech.display_name(), "pipeline ready");
        MessagePipeline {
            sessions,
            settings,
            status,
            collaborators,
            audio: AudioSlot::new(),
            sink,
            state: Mutex::new(PipelineState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sessions(&self) -> &Arc<Mutex<SessionManager>> {
        &self.sessions
    }

    pub fn settings(&self) -> &Arc<RwLock<Settings>> {
        &self.settings
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    pub fn audio_slot(&self) -> &AudioSlot {
        &self.audio
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one turn for typed (or transcribed) text.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            debug!("empty input ignored");
            return SendOutcome::Rejected(RejectReason::Empty);
        }
        let Some(_turn) = TurnGuard::enter(&self.in_flight) else {
            info!("send rejected: a turn is already in flight");
            return SendOutcome::Rejected(RejectReason::Busy);
        };

        let settings = self.settings_snapshot();
        let (origin, history) = {
            let mut sessions = self.lock_sessions();
            let origin = sessions.ensure_current();
            sessions.append_to(&origin, Role::User, text);
            let history = sessions.wire_history(&origin);
            (origin, history)
        };

        self.set_state(PipelineState::Sending);
        self.status.set(Service::Llm, IndicatorState::Processing);
        self.sink.emit(ViewEvent::LoadingShown);

        let request = ChatRequest {
            provider: settings.llm_provider.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model_name.clone(),
            messages: history,
            temperature: settings.temperature,
        };

        let reply = match self.collaborators.chat.chat(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(session = %origin, kind = e.kind(), error = %e, "chat request failed");
                self.set_state(PipelineState::LlmError);
                self.append_reply(&origin, FALLBACK_REPLY);
                self.status.set(Service::Llm, IndicatorState::Error);
                self.sink.emit(ViewEvent::notify(
                    format!("Request failed, please check your settings ({e})"),
                    Severity::Error,
                ));
                self.finish_turn();
                return SendOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        self.append_reply(&origin, &reply);
        self.set_state(PipelineState::Responded);
        self.status.set(Service::Llm, IndicatorState::Active);

        let spoken = reply.trim();
        let speech = if !settings.enable_tts {
            SpeechOutcome::Disabled
        } else if spoken.chars().count() < MIN_SPOKEN_CHARS {
            debug!("reply too short to speak");
            SpeechOutcome::Skipped
        } else {
            self.speak(spoken, &settings).await
        };

        self.finish_turn();
        SendOutcome::Replied { reply, speech }
    }

    /// Transcribe a recording, then run it through [`send`](Self::send).
    pub async fn send_voice(&self, audio: &[u8], file_name: &str) -> SendOutcome {
        if self.is_busy() {
            info!("voice input rejected: a turn is already in flight");
            return SendOutcome::Rejected(RejectReason::Busy);
        }
        let Some(transcriber) = self.collaborators.transcriber.clone() else {
            warn!("voice input without a transcriber");
            self.sink.emit(ViewEvent::notify(
                "Speech recognition is not available",
                Severity::Error,
            ));
            return SendOutcome::Failed {
                reason: "no transcriber configured".into(),
            };
        };

        let settings = self.settings_snapshot();
        let request = TranscriptionRequest {
            engine: settings.asr_engine.clone(),
            language: settings.asr_language.clone(),
            api_key: settings.api_key.clone(),
        };

        self.status.set(Service::Asr, IndicatorState::Processing);
        match transcriber.transcribe(audio, file_name, &request).await {
            Ok(text) => {
                self.status.set(Service::Asr, IndicatorState::Active);
                info!(chars = text.chars().count(), "voice input transcribed");
                self.send(&text).await
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "transcription failed");
                self.status.set(Service::Asr, IndicatorState::Error);
                self.sink.emit(ViewEvent::notify(
                    format!("Speech recognition failed: {e}"),
                    Severity::Error,
                ));
                SendOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn speak(&self, text: &str, settings: &Settings) -> SpeechOutcome {
        self.set_state(PipelineState::Speaking);
        self.status.set(Service::Tts, IndicatorState::Processing);

        let request = SpeechRequest {
            text: text.to_string(),
            voice: settings.voice_select.clone(),
            rate: settings.speech_rate,
            volume: settings.speech_volume,
            engine: settings.tts_engine.clone(),
        };

        match self.synthesize_and_play(&request).await {
            Ok(()) => {
                self.status.set(Service::Tts, IndicatorState::Active);
                SpeechOutcome::Played
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "speech failed");
                self.set_state(PipelineState::TtsError);
                self.status.set(Service::Tts, IndicatorState::Error);
                self.sink.emit(ViewEvent::notify(
                    format!("Speech synthesis failed: {e}"),
                    Severity::Error,
                ));
                SpeechOutcome::Failed
            }
        }
    }

    async fn synthesize_and_play(&self, request: &SpeechRequest) -> VoxResult<()> {
        let bytes = self.collaborators.speech.synthesize(request).await?;
        let clip = AudioClip::new(bytes)?;
        let lease = self.audio.acquire(clip).await?;
        lease.play(self.collaborators.player.as_ref()).await
    }

    fn append_reply(&self, origin: &SessionId, content: &str) {
        // `append_to` logs when the origin session was deleted mid-turn.
        let _ = self
            .lock_sessions()
            .append_to(origin, Role::Assistant, content);
    }

    fn finish_turn(&self) {
        self.sink.emit(ViewEvent::LoadingHidden);
        self.set_state(PipelineState::Idle);
    }

    fn set_state(&self, next: PipelineState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = %*state, to = %next, "pipeline state");
        *state = next;
    }

    fn lock_sessions(&self) -> MutexGuard<'_, SessionManager> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings_snapshot(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for MessagePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagePipeline")
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
