//! Session coordinator and the monitoring loops
//!
//! The coordinator owns one session's lifecycle: idle until a profile is
//! submitted, active while the loops run, stopped when the process-wide
//! shutdown watch flips. Cancellation is cooperative only; every loop
//! observes the watch inside its own bounded wait.

pub mod alarm;
pub mod emotion;
pub mod speech;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;
use crate::config::PatientProfile;
use crate::db::StoreHandle;
use crate::session::SessionState;
use crate::vision::{EmotionClassifier, FrameSource};
use crate::voice::VoiceSink;

pub use alarm::{REMINDER_LINE, run_alarm_loop};
pub use emotion::run_emotion_loop;
pub use speech::{Heard, MicSpeechSource, SpeechSource, run_speech_loop};

/// Poll/sampling intervals for the monitoring loops
#[derive(Debug, Clone, Copy)]
pub struct MonitorIntervals {
    /// Delay between emotion samples
    pub emotion: Duration,
    /// Alarm schedule poll interval
    pub alarm: Duration,
}

impl Default for MonitorIntervals {
    fn default() -> Self {
        Self {
            emotion: Duration::from_secs(600),
            alarm: Duration::from_secs(60),
        }
    }
}

/// Coordinates one patient session across the monitoring loops
pub struct Coordinator {
    session: Arc<SessionState>,
    store: StoreHandle,
    sink: VoiceSink,
    intervals: MonitorIntervals,
    shutdown: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Coordinator {
    /// Create an idle coordinator
    #[must_use]
    pub fn new(
        store: StoreHandle,
        sink: VoiceSink,
        intervals: MonitorIntervals,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            session: Arc::new(SessionState::new()),
            store,
            sink,
            intervals,
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// The shared session state
    #[must_use]
    pub fn session(&self) -> Arc<SessionState> {
        Arc::clone(&self.session)
    }

    /// Submit a patient profile and start monitoring
    ///
    /// Aborts any loops from a previous submission, resets the session
    /// counters, snapshots the active patient name and allergen list,
    /// enqueues the record insert, and spawns the speech, emotion, and
    /// alarm loops. At most one set of loops feeds the session.
    ///
    /// # Errors
    ///
    /// Returns error if the store worker is gone
    pub async fn submit(
        &mut self,
        profile: &PatientProfile,
        speech: Box<dyn SpeechSource>,
        camera: Box<dyn FrameSource>,
        classifier: Arc<dyn EmotionClassifier>,
    ) -> Result<()> {
        self.stop_running();

        let record = profile.to_record();
        let allergens = record.allergic_foods.clone();

        self.session.begin(&record.name);
        self.store.insert(record.clone()).await?;
        tracing::info!(patient = %record.name, "saved data for patient");

        self.tasks.push(tokio::spawn(run_speech_loop(
            speech,
            self.session(),
            self.store.clone(),
            self.sink.clone(),
            allergens,
            self.shutdown.clone(),
        )));

        self.tasks.push(tokio::spawn(run_emotion_loop(
            camera,
            classifier,
            self.session(),
            self.sink.clone(),
            self.intervals.emotion,
            self.shutdown.clone(),
        )));

        self.tasks.push(tokio::spawn(run_alarm_loop(
            self.store.clone(),
            self.session(),
            self.sink.clone(),
            self.intervals.alarm,
            self.shutdown.clone(),
        )));

        Ok(())
    }

    /// Abort the loops from a previous submission, if any
    fn stop_running(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        tracing::debug!("replacing monitoring loops from previous submission");
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Wait for every monitoring loop to observe shutdown and exit
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "monitoring task panicked");
            }
        }
        self.session.end();
        tracing::info!("session stopped");
    }
}
