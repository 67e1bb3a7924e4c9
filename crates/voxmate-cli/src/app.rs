//! Composition root: loads config, settings and sessions, and wires the
//! pipeline to the HTTP collaborators and the local audio player.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use anyhow::{Context, Result};
use tracing::{info, warn};

use voxmate_core::config::{load_config, Config};
use voxmate_core::events::EventSink;
use voxmate_core::session::{SessionManager, SessionStore};
use voxmate_core::settings::Settings;
use voxmate_core::status::StatusTracker;
use voxmate_pipeline::{AudioPlayer, Collaborators, MessagePipeline};
use voxmate_providers::{HttpChatClient, HttpSpeechClient, HttpTranscriber};

use crate::console::ConsoleSink;
use crate::player::{CommandPlayer, MissingPlayer};

/// How a command wants the app assembled.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppOptions {
    /// Turn speech off for this run without touching saved settings.
    pub no_speech: bool,
    /// Log lines are on; suppress the thinking placeholder.
    pub logs: bool,
}

pub struct App {
    pub config: Config,
    pub store: SessionStore,
    pub pipeline: MessagePipeline,
}

impl App {
    pub fn open(options: AppOptions) -> Result<Self> {
        let config = load_config(None);
        let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink::new(!options.logs, options.logs));
        Self::with_config(config, options, sink)
    }

    pub fn with_config(config: Config, options: AppOptions, sink: Arc<dyn EventSink>) -> Result<Self> {
        let store = SessionStore::new(config.storage.data_path());
        let mut settings = store.load_settings();
        if options.no_speech {
            settings.enable_tts = false;
        }

        let sessions = SessionManager::open(store.clone(), Arc::clone(&sink));
        let status = StatusTracker::with_clear_delay(Arc::clone(&sink), config.status.clear_delay());

        let backend = &config.backend;
        let chat = HttpChatClient::new(&backend.api_base, backend.chat_timeout())
            .context("failed to build chat client")?;
        let speech = HttpSpeechClient::new(&backend.api_base, backend.speech_timeout())
            .context("failed to build speech client")?;
        let transcriber = HttpTranscriber::new(&backend.api_base, backend.speech_timeout())
            .context("failed to build transcription client")?;

        let player: Arc<dyn AudioPlayer> =
            match CommandPlayer::resolve(config.playback.command.as_deref()) {
                Some(player) => Arc::new(player),
                None => {
                    if settings.enable_tts {
                        warn!("no audio player found, replies will not be spoken");
                    }
                    Arc::new(MissingPlayer)
                }
            };

        info!(api_base = %backend.api_base, data_dir = %store.dir().display(), "app ready");

        let pipeline = MessagePipeline::new(
            Arc::new(Mutex::new(sessions)),
            Arc::new(RwLock::new(settings)),
            status,
            Collaborators {
                chat: Arc::new(chat),
                speech: Arc::new(speech),
                transcriber: Some(Arc::new(transcriber)),
                player,
            },
            sink,
        );

        Ok(App {
            config,
            store,
            pipeline,
        })
    }

    pub fn sessions(&self) -> MutexGuard<'_, SessionManager> {
        self.pipeline
            .sessions()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> Settings {
        self.pipeline
            .settings()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmate_core::events::NullSink;

    fn config_in(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = dir.path().display().to_string();
        config.playback.command = Some("true".into());
        config
    }

    #[test]
    fn test_open_creates_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::with_config(config_in(&dir), AppOptions::default(), Arc::new(NullSink)).unwrap();
        assert_eq!(app.sessions().sessions().len(), 1);
        assert_eq!(app.store.dir(), dir.path());
    }

    #[test]
    fn test_no_speech_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let options = AppOptions {
            no_speech: true,
            ..AppOptions::default()
        };
        let app = App::with_config(config_in(&dir), options, Arc::new(NullSink)).unwrap();
        assert!(!app.settings().enable_tts);
        assert!(app.store.load_settings().enable_tts);
    }
}
