//! Shared test utilities

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use bedside::db::{PatientRepo, init_memory, spawn_store_worker};
use bedside::monitor::{Heard, SpeechSource};
use bedside::{EmotionClassifier, EmotionScore, Frame, FrameSource, PatientRecord, StoreHandle};

/// Set up an in-memory store worker; returns the handle and the shutdown sender
#[must_use]
pub fn setup_store() -> (StoreHandle, watch::Sender<bool>) {
    let repo = PatientRepo::new(init_memory().expect("failed to init test db"));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (store, _worker) = spawn_store_worker(repo, shutdown_rx);
    (store, shutdown_tx)
}

/// A patient record with sensible test defaults
#[must_use]
pub fn sample_record(name: &str) -> PatientRecord {
    PatientRecord {
        name: name.to_string(),
        age: 72,
        disease: "hypertension".to_string(),
        allergic_foods: vec!["peanut".to_string()],
        schedule: vec!["09:00".to_string(), "14:30".to_string()],
        food_intake: 0,
        water_intake: 0,
    }
}

/// Speech source that replays a script, then stays silent forever
pub struct ScriptedSpeech {
    script: VecDeque<Heard>,
}

impl ScriptedSpeech {
    #[must_use]
    pub fn new(script: Vec<Heard>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

#[async_trait]
impl SpeechSource for ScriptedSpeech {
    async fn next(&mut self) -> bedside::Result<Heard> {
        match self.script.pop_front() {
            Some(heard) => Ok(heard),
            // Script exhausted: block until the loop is shut down
            None => std::future::pending().await,
        }
    }
}

/// Speech source the test feeds one statement at a time
pub struct ChannelSpeech {
    feed: mpsc::Receiver<Heard>,
}

impl ChannelSpeech {
    #[must_use]
    pub fn new() -> (mpsc::Sender<Heard>, Self) {
        let (tx, feed) = mpsc::channel(8);
        (tx, Self { feed })
    }
}

#[async_trait]
impl SpeechSource for ChannelSpeech {
    async fn next(&mut self) -> bedside::Result<Heard> {
        match self.feed.recv().await {
            Some(heard) => Ok(heard),
            // Feed dropped: block until the loop is shut down
            None => std::future::pending().await,
        }
    }
}

/// Camera that always yields a tiny frame
pub struct StubCamera;

#[async_trait]
impl FrameSource for StubCamera {
    async fn capture(&mut self) -> bedside::Result<Frame> {
        Ok(Frame(vec![0xff, 0xd8, 0xff]))
    }
}

/// Classifier returning a fixed score set
pub struct StubClassifier(pub Vec<EmotionScore>);

#[async_trait]
impl EmotionClassifier for StubClassifier {
    async fn classify(&self, _frame: &Frame) -> bedside::Result<Vec<EmotionScore>> {
        Ok(self.0.clone())
    }
}
