//! Speech-to-text (STT) processing

use crate::{Error, Result};

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech to text via the `OpenAI` Whisper API
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }

    /// Transcribe WAV audio bytes to text
    ///
    /// An empty transcript means the recognizer could not map the audio
    /// to words; callers treat that as an unintelligible window, not an
    /// error. Errors here are transport or API failures.
    ///
    /// # Errors
    ///
    /// Returns error if the transcription request fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        let text = result.text.trim().to_string();

        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }
}
