//! Configuration and patient profile loading
//!
//! The daemon config is a TOML file, a partial overlay on top of
//! defaults. The patient profile is a separate TOML file standing in for
//! the intake form: the same fields, comma-separated where the form is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::db::{PatientRecord, split_csv};
use crate::monitor::MonitorIntervals;
use crate::{Error, Result};

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for the database file
    pub data_dir: PathBuf,

    /// Voice input/output settings
    pub voice: VoiceConfig,

    /// Camera and emotion classification settings
    pub camera: CameraConfig,

    /// Loop scheduling settings
    pub monitor: MonitorConfig,
}

/// Voice processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f32,

    /// Microphone listen window in seconds
    pub listen_secs: u64,
}

/// Camera and emotion classifier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// JPEG snapshot endpoint of the patient-facing camera
    pub snapshot_url: String,

    /// Emotion scoring endpoint
    pub emotion_api_url: String,
}

/// Loop scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between emotion samples
    pub emotion_interval_secs: u64,

    /// Seconds between alarm schedule polls
    pub alarm_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            voice: VoiceConfig::default(),
            camera: CameraConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            listen_secs: 5,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            snapshot_url: "http://127.0.0.1:8080/snapshot.jpg".to_string(),
            emotion_api_url: "http://127.0.0.1:8081/v1/emotions".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            emotion_interval_secs: 600,
            alarm_interval_secs: 60,
        }
    }
}

impl Config {
    /// Load config from the given path, or from the default location
    ///
    /// A missing file yields the defaults; a present but malformed file
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&raw)?;

        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Loop intervals as durations
    #[must_use]
    pub const fn intervals(&self) -> MonitorIntervals {
        MonitorIntervals {
            emotion: Duration::from_secs(self.monitor.emotion_interval_secs),
            alarm: Duration::from_secs(self.monitor.alarm_interval_secs),
        }
    }

    /// Microphone listen window
    #[must_use]
    pub const fn listen_window(&self) -> Duration {
        Duration::from_secs(self.voice.listen_secs)
    }
}

/// The `OpenAI` API key, from the environment
///
/// # Errors
///
/// Returns error if the variable is unset or empty
pub fn openai_api_key() -> Result<String> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("dev", "bedside", "bedside").map_or_else(
        || PathBuf::from("bedside.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "bedside", "bedside")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}

/// A patient profile as submitted through the intake form
///
/// `allergic_foods` and `schedule` are comma-separated strings, exactly
/// as typed into the form fields.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientProfile {
    pub name: String,
    pub age: i64,
    pub disease: String,
    #[serde(default)]
    pub allergic_foods: String,
    #[serde(default)]
    pub schedule: String,
}

impl PatientProfile {
    /// Load a profile from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or the name
    /// is empty
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let profile: Self = toml::from_str(&raw)?;

        if profile.name.trim().is_empty() {
            return Err(Error::Config("patient name must not be empty".to_string()));
        }

        Ok(profile)
    }

    /// Build the record inserted at submission (counters start at zero)
    #[must_use]
    pub fn to_record(&self) -> PatientRecord {
        PatientRecord {
            name: self.name.trim().to_string(),
            age: self.age,
            disease: self.disease.clone(),
            allergic_foods: split_csv(&self.allergic_foods),
            schedule: split_csv(&self.schedule),
            food_intake: 0,
            water_intake: 0,
        }
    }
}
