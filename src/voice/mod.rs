//! Voice input/output: microphone capture, transcription, speech synthesis

pub mod capture;
pub mod playback;
pub mod sink;
pub mod stt;
pub mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, has_speech, samples_to_wav};
pub use playback::AudioPlayback;
pub use sink::{VoiceSink, spawn_voice_renderer};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
