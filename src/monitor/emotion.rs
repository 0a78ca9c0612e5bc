//! Emotion sampling loop
//!
//! Periodically grabs one camera frame, classifies the dominant emotion,
//! and speaks an empathetic line addressed to the patient. Camera failure
//! is the one loop-fatal error in the system: sampling stops but every
//! other loop keeps running. The long inter-sample wait races the
//! shutdown watch, so stopping the daemon never waits out the delay.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::Result;
use crate::session::SessionState;
use crate::vision::{EmotionClassifier, FrameSource, empathy_line, top_emotion};
use crate::voice::VoiceSink;

/// Run one sampling tick
///
/// Returns `Err` only for a frame capture failure; classification
/// problems are logged and swallowed so the loop keeps sampling.
pub async fn emotion_tick(
    camera: &mut dyn FrameSource,
    classifier: &dyn EmotionClassifier,
    session: &SessionState,
    sink: &VoiceSink,
) -> Result<()> {
    let frame = camera.capture().await?;

    let scores = match classifier.classify(&frame).await {
        Ok(scores) => scores,
        Err(e) => {
            tracing::warn!(error = %e, "emotion classification failed");
            return Ok(());
        }
    };

    let Some(top) = top_emotion(&scores) else {
        tracing::debug!("no face in frame");
        return Ok(());
    };

    tracing::info!(emotion = %top.label, score = top.score, "detected emotion");

    if let Some(line) = empathy_line(&top.label) {
        let message = format!("{}, {line}", session.patient());
        if let Err(e) = sink.speak(message).await {
            tracing::error!(error = %e, "empathy speech enqueue failed");
        }
    }

    Ok(())
}

/// Run the emotion sampling loop until shutdown or camera failure
pub async fn run_emotion_loop(
    mut camera: Box<dyn FrameSource>,
    classifier: Arc<dyn EmotionClassifier>,
    session: Arc<SessionState>,
    sink: VoiceSink,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if let Err(e) = emotion_tick(camera.as_mut(), classifier.as_ref(), &session, &sink).await {
            // Frame capture is assumed unrecoverable; stop sampling only
            tracing::error!(error = %e, "frame capture failed, stopping emotion sampling");
            break;
        }

        tracing::debug!(secs = interval.as_secs(), "waiting before next emotion sample");
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("emotion loop shutting down");
                    break;
                }
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}
