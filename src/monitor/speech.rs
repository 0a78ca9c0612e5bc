//! Speech capture loop: listen, transcribe, classify, act
//!
//! The loop owns its microphone and STT client through the
//! [`SpeechSource`] seam. Every outcome short of shutdown is survivable:
//! unintelligible audio and recognizer transport failures get a spoken
//! notice and the loop keeps listening.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::db::StoreHandle;
use crate::intake::{IntakeEvent, classify};
use crate::session::SessionState;
use crate::voice::{AudioCapture, SAMPLE_RATE, SpeechToText, VoiceSink, has_speech, samples_to_wav};
use crate::{Error, Result};

/// Spoken when the recognizer could not map audio to words
pub const APOLOGY_LINE: &str = "Sorry, I did not understand that.";

/// Spoken when the recognition service itself fails
pub const SERVICE_ERROR_LINE: &str = "There was an issue with the speech recognition service.";

/// Spoken when a statement matches no intake rule
pub const NOT_DETECTED_LINE: &str = "I did not detect food or water intake in your statement.";

/// Spoken in addition to the confirmation when an allergen is mentioned
pub const ALLERGY_WARNING_LINE: &str = "Warning: The intake includes an allergic food.";

/// Spoken when a details request finds no stored record
pub const DETAILS_ERROR_LINE: &str = "Error retrieving details from the database.";

/// Outcome of one listen window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    /// A transcribed statement
    Utterance(String),
    /// Speech energy was present but the recognizer produced nothing
    Unintelligible,
    /// Nothing worth transcribing in the window
    Silence,
}

/// Source of transcribed patient statements
///
/// Errors are recognition-service failures; they are spoken about and
/// the loop continues.
#[async_trait]
pub trait SpeechSource: Send {
    /// Listen for one bounded window
    async fn next(&mut self) -> Result<Heard>;
}

/// Production speech source: cpal microphone + Whisper transcription
///
/// The capture stream is `!Send`, so each listen window runs on a
/// blocking thread that opens the device, records, and hands the
/// samples back; nothing audio-related crosses an await point.
pub struct MicSpeechSource {
    stt: SpeechToText,
    window: Duration,
}

impl MicSpeechSource {
    /// Create a microphone-backed source with a bounded listen window
    ///
    /// Probes the input device up front so a missing microphone fails
    /// at startup rather than on the first listen window.
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be opened
    pub fn new(stt: SpeechToText, window: Duration) -> Result<Self> {
        drop(AudioCapture::new()?);
        Ok(Self { stt, window })
    }
}

#[async_trait]
impl SpeechSource for MicSpeechSource {
    async fn next(&mut self) -> Result<Heard> {
        let window = self.window;
        let samples = tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
            let mut capture = AudioCapture::new()?;
            capture.start()?;
            std::thread::sleep(window);
            capture.stop();
            Ok(capture.take_buffer())
        })
        .await
        .map_err(|e| Error::Audio(e.to_string()))??;

        if !has_speech(&samples) {
            return Ok(Heard::Silence);
        }

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let text = self.stt.transcribe(&wav).await?;

        if text.is_empty() {
            return Ok(Heard::Unintelligible);
        }
        Ok(Heard::Utterance(text))
    }
}

/// Run the speech capture loop until shutdown
///
/// `allergens` is the session-scoped snapshot captured at submission.
pub async fn run_speech_loop(
    mut source: Box<dyn SpeechSource>,
    session: Arc<SessionState>,
    store: StoreHandle,
    sink: VoiceSink,
    allergens: Vec<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("listening for food, water intake or details/status");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("speech loop shutting down");
                    break;
                }
            }
            heard = source.next() => {
                match heard {
                    Ok(Heard::Utterance(text)) => {
                        tracing::info!(statement = %text, "patient said");
                        let event = classify(&text, &allergens);
                        apply_event(&event, &session, &store, &sink).await;
                    }
                    Ok(Heard::Unintelligible) => {
                        speak(&sink, APOLOGY_LINE).await;
                    }
                    Ok(Heard::Silence) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "speech recognition failed");
                        speak(&sink, SERVICE_ERROR_LINE).await;
                    }
                }
            }
        }
    }
}

/// Perform the side effects of one classified statement
///
/// Within one event the order is fixed: counter increment, then store
/// enqueue, then confirmation speech.
pub async fn apply_event(
    event: &IntakeEvent,
    session: &SessionState,
    store: &StoreHandle,
    sink: &VoiceSink,
) {
    let patient = session.patient();

    match event {
        IntakeEvent::Details => match store.select(&patient).await {
            Ok(Some(record)) => speak(sink, record.spoken_summary()).await,
            Ok(None) => {
                tracing::warn!(patient = %patient, "no record for details request");
                speak(sink, DETAILS_ERROR_LINE).await;
            }
            Err(e) => tracing::error!(error = %e, "details lookup failed"),
        },
        IntakeEvent::Status => {
            let status = format!(
                "Food intake: {} times, Water intake: {} times",
                session.food_count(),
                session.water_count()
            );
            speak(sink, status).await;
        }
        IntakeEvent::Food { allergy_warning } => {
            let count = session.record_food();
            enqueue_update(store.update_food(to_stored(count), &patient).await, "food");
            speak(
                sink,
                format!("Food intake recorded. This is meal number {count}."),
            )
            .await;
            if *allergy_warning {
                tracing::warn!(patient = %patient, "allergic food detected");
                speak(sink, ALLERGY_WARNING_LINE).await;
            }
        }
        IntakeEvent::Water => {
            let count = session.record_water();
            enqueue_update(store.update_water(to_stored(count), &patient).await, "water");
            speak(
                sink,
                format!("Water intake recorded. This is drink number {count}."),
            )
            .await;
        }
        IntakeEvent::Unrecognized => {
            speak(sink, NOT_DETECTED_LINE).await;
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn to_stored(count: u64) -> i64 {
    count as i64
}

fn enqueue_update(result: Result<()>, kind: &str) {
    if let Err(e) = result {
        tracing::error!(error = %e, kind, "store update enqueue failed");
    }
}

async fn speak(sink: &VoiceSink, text: impl Into<String>) {
    if let Err(e) = sink.speak(text).await {
        tracing::error!(error = %e, "speech enqueue failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{PatientRecord, PatientRepo, init_memory, spawn_store_worker};

    struct Fixture {
        session: Arc<SessionState>,
        store: StoreHandle,
        sink: VoiceSink,
        spoken: tokio::sync::mpsc::Receiver<String>,
        _shutdown: watch::Sender<bool>,
    }

    fn setup(patient: &str) -> Fixture {
        let repo = PatientRepo::new(init_memory().unwrap());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (store, _worker) = spawn_store_worker(repo, shutdown_rx);
        let (sink, spoken) = VoiceSink::channel();

        let session = Arc::new(SessionState::new());
        session.begin(patient);

        Fixture {
            session,
            store,
            sink,
            spoken,
            _shutdown: shutdown_tx,
        }
    }

    fn sample_record(name: &str) -> PatientRecord {
        PatientRecord {
            name: name.to_string(),
            age: 72,
            disease: "hypertension".to_string(),
            allergic_foods: vec!["peanut".to_string()],
            schedule: vec!["09:00".to_string()],
            food_intake: 0,
            water_intake: 0,
        }
    }

    #[tokio::test]
    async fn test_food_event_increments_speaks_and_persists() {
        let mut fx = setup("ada");
        fx.store.insert(sample_record("ada")).await.unwrap();

        let event = IntakeEvent::Food {
            allergy_warning: false,
        };
        apply_event(&event, &fx.session, &fx.store, &fx.sink).await;
        apply_event(&event, &fx.session, &fx.store, &fx.sink).await;

        assert_eq!(fx.session.food_count(), 2);
        assert_eq!(
            fx.spoken.recv().await.unwrap(),
            "Food intake recorded. This is meal number 1."
        );
        assert_eq!(
            fx.spoken.recv().await.unwrap(),
            "Food intake recorded. This is meal number 2."
        );

        // Store converges within one queue hop
        let stored = fx.store.select("ada").await.unwrap().unwrap();
        assert_eq!(stored.food_intake, 2);
    }

    #[tokio::test]
    async fn test_food_with_allergy_speaks_warning_after_confirmation() {
        let mut fx = setup("ada");
        fx.store.insert(sample_record("ada")).await.unwrap();

        let event = IntakeEvent::Food {
            allergy_warning: true,
        };
        apply_event(&event, &fx.session, &fx.store, &fx.sink).await;

        assert_eq!(
            fx.spoken.recv().await.unwrap(),
            "Food intake recorded. This is meal number 1."
        );
        assert_eq!(fx.spoken.recv().await.unwrap(), ALLERGY_WARNING_LINE);
    }

    #[tokio::test]
    async fn test_status_reads_counters_without_store() {
        let mut fx = setup("ada");
        // No record inserted: status must not need one
        fx.session.record_food();
        fx.session.record_water();
        fx.session.record_water();

        apply_event(&IntakeEvent::Status, &fx.session, &fx.store, &fx.sink).await;

        assert_eq!(
            fx.spoken.recv().await.unwrap(),
            "Food intake: 1 times, Water intake: 2 times"
        );
    }

    #[tokio::test]
    async fn test_details_speaks_summary() {
        let mut fx = setup("ada");
        fx.store.insert(sample_record("ada")).await.unwrap();

        apply_event(&IntakeEvent::Details, &fx.session, &fx.store, &fx.sink).await;

        let line = fx.spoken.recv().await.unwrap();
        assert!(line.contains("Name: ada"));
        assert!(line.contains("Disease: hypertension"));
    }

    #[tokio::test]
    async fn test_details_with_missing_record_speaks_error() {
        let mut fx = setup("ada");

        apply_event(&IntakeEvent::Details, &fx.session, &fx.store, &fx.sink).await;

        assert_eq!(fx.spoken.recv().await.unwrap(), DETAILS_ERROR_LINE);
    }

    #[tokio::test]
    async fn test_unrecognized_speaks_not_detected() {
        let mut fx = setup("ada");

        apply_event(&IntakeEvent::Unrecognized, &fx.session, &fx.store, &fx.sink).await;

        assert_eq!(fx.spoken.recv().await.unwrap(), NOT_DETECTED_LINE);
    }
}
