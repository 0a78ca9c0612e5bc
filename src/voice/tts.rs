//! Text-to-speech (TTS) processing

use crate::{Error, Result};

/// Synthesizes speech from text via the `OpenAI` TTS API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: String, voice: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed,
            model,
        })
    }

    /// Synthesize text to speech, returning MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
