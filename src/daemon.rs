//! Daemon - the bedside monitoring service
//!
//! Wires the process-scoped pieces (store worker, voice renderer,
//! shutdown signal) to a session coordinator and runs until interrupted.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{Config, PatientProfile, openai_api_key};
use crate::db::{self, PatientRepo, spawn_store_worker};
use crate::monitor::{Coordinator, MicSpeechSource};
use crate::vision::{SnapshotCamera, VisionEmotionClassifier};
use crate::voice::{AudioPlayback, SpeechToText, TextToSpeech, VoiceSink, spawn_voice_renderer};
use crate::{Error, Result};

/// The bedside daemon
pub struct Daemon {
    config: Config,
    db: db::DbPool,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db_path = config.data_dir.join("bedside.db");
        let db = db::init(&db_path)?;

        tracing::info!(path = %db_path.display(), "database opened");
        Ok(Self { config, db })
    }

    /// Run a monitoring session for the given profile until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if startup fails; runtime loop errors are contained
    /// within their loops
    pub async fn run(self, profile: PatientProfile) -> Result<()> {
        let api_key = openai_api_key()?;

        // Process-wide cooperative stop signal
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                let _ = shutdown_tx.send(true);
            }
        });

        // Single-writer store worker
        let repo = PatientRepo::new(self.db.clone());
        let (store, store_task) = spawn_store_worker(repo, shutdown_rx.clone());

        // Serialized voice output
        let tts = TextToSpeech::new(
            api_key.clone(),
            self.config.voice.tts_voice.clone(),
            self.config.voice.tts_speed,
            self.config.voice.tts_model.clone(),
        )?;
        let playback = AudioPlayback::new()?;
        let (sink, speech_rx) = VoiceSink::channel();
        let renderer_task = spawn_voice_renderer(speech_rx, tts, playback, shutdown_rx.clone());

        // Session inputs
        let stt = SpeechToText::new(api_key.clone(), self.config.voice.stt_model.clone())?;
        let speech = MicSpeechSource::new(stt, self.config.listen_window())?;
        let camera = SnapshotCamera::new(self.config.camera.snapshot_url.clone());
        let classifier = Arc::new(VisionEmotionClassifier::new(
            self.config.camera.emotion_api_url.clone(),
            api_key,
        ));

        let mut coordinator = Coordinator::new(
            store,
            sink,
            self.config.intervals(),
            shutdown_rx.clone(),
        );
        coordinator
            .submit(&profile, Box::new(speech), Box::new(camera), classifier)
            .await?;

        tracing::info!(patient = %profile.name, "monitoring started");

        // Block until the stop signal, then wait out the bounded exits
        let mut shutdown = shutdown_rx;
        shutdown
            .wait_for(|stopped| *stopped)
            .await
            .map_err(|_| Error::Channel("shutdown signal dropped".to_string()))?;

        coordinator.join().await;
        if let Err(e) = store_task.await {
            tracing::error!(error = %e, "store worker panicked");
        }
        if let Err(e) = renderer_task.await {
            tracing::error!(error = %e, "voice renderer panicked");
        }

        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Direct read access for CLI queries (no session running)
    #[must_use]
    pub fn patient_repo(&self) -> PatientRepo {
        PatientRepo::new(self.db.clone())
    }
}
