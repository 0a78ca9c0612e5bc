//! Serialized voice output sink
//!
//! Speech synthesis and playback are not reentrant, and every monitoring
//! loop wants to talk. The sink is a single-consumer queue: loops share
//! cloneable [`VoiceSink`] handles while one renderer task owns the TTS
//! client and the output device, so utterances play one at a time in
//! enqueue order.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::{Error, Result};

/// Depth of the speech queue; a stuck device backpressures speakers
const QUEUE_DEPTH: usize = 16;

/// Cloneable handle for enqueuing speech
#[derive(Clone)]
pub struct VoiceSink {
    tx: mpsc::Sender<String>,
}

impl VoiceSink {
    /// Create a sink together with the receiving end of its queue
    ///
    /// Production code hands the receiver to [`spawn_voice_renderer`];
    /// tests read it directly to assert on spoken lines.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        (Self { tx }, rx)
    }

    /// Enqueue one utterance
    ///
    /// # Errors
    ///
    /// Returns error if the renderer has shut down
    pub async fn speak(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        tracing::debug!(text = %text, "speech enqueued");
        self.tx
            .send(text)
            .await
            .map_err(|_| Error::Channel("voice renderer queue closed".to_string()))
    }
}

/// Spawn the renderer task that drains the speech queue
///
/// Synthesis or playback failures are logged and the renderer moves on
/// to the next utterance; losing one line of speech must not silence
/// the rest of the session.
#[must_use]
pub fn spawn_voice_renderer(
    mut rx: mpsc::Receiver<String>,
    tts: TextToSpeech,
    mut playback: AudioPlayback,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("voice renderer started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("voice renderer shutting down");
                        break;
                    }
                }
                text = rx.recv() => {
                    let Some(text) = text else {
                        tracing::debug!("speech queue closed");
                        break;
                    };
                    if let Err(e) = render(&tts, &mut playback, &text).await {
                        tracing::error!(error = %e, text = %text, "speech output failed");
                    }
                }
            }
        }
    })
}

async fn render(tts: &TextToSpeech, playback: &mut AudioPlayback, text: &str) -> Result<()> {
    let audio = tts.synthesize(text).await?;
    playback.play_mp3(&audio).await?;
    tracing::debug!(text = %text, "spoken");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_speak_preserves_enqueue_order() {
        let (sink, mut rx) = VoiceSink::channel();

        sink.speak("first").await.unwrap();
        sink.speak("second").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "first");
        assert_eq!(rx.recv().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_speak_after_renderer_gone_is_error() {
        let (sink, rx) = VoiceSink::channel();
        drop(rx);

        assert!(sink.speak("anyone there").await.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_one_queue() {
        let (sink, mut rx) = VoiceSink::channel();
        let other = sink.clone();

        sink.speak("from speech loop").await.unwrap();
        other.speak("from alarm loop").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "from speech loop");
        assert_eq!(rx.recv().await.unwrap(), "from alarm loop");
    }
}
