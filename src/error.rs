//! Error types for the bedside daemon

use thiserror::Error;

/// Result type alias for bedside operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bedside daemon
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Camera frame capture error
    #[error("camera error: {0}")]
    Camera(String),

    /// Emotion classification error
    #[error("vision error: {0}")]
    Vision(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal channel error (receiver dropped, queue closed)
    #[error("channel error: {0}")]
    Channel(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
