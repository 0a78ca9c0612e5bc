//! Bedside - single-patient monitoring daemon
//!
//! This library provides the core functionality for the bedside daemon:
//! - Speech-driven food/water intake tallying
//! - Periodic camera-based emotion sampling
//! - Schedule-driven voice reminders
//! - Single-writer patient record persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Monitoring loops                    │
//! │   Speech intake  │  Emotion sampling  │  Alarms     │
//! └────────┬──────────────────┬───────────────┬─────────┘
//!          │                  │               │
//! ┌────────▼──────────────────▼───────────────▼─────────┐
//! │                    Coordinator                       │
//! │   SessionState  │  StoreHandle  │  VoiceSink        │
//! └────────┬───────────────────────────────┬────────────┘
//!          │                               │
//! ┌────────▼────────────┐   ┌──────────────▼────────────┐
//! │  Store worker        │   │  Voice renderer           │
//! │  (single writer)     │   │  (single speaker)         │
//! └─────────────────────┘   └───────────────────────────┘
//! ```
//!
//! Everything above the worker and renderer communicates only through
//! their queues, so the SQLite store has at most one writer and speech
//! output never interleaves.

pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod intake;
pub mod monitor;
pub mod session;
pub mod vision;
pub mod voice;

pub use config::{Config, PatientProfile};
pub use daemon::Daemon;
pub use db::{DbConn, DbPool, PatientRecord, PatientRepo, StoreHandle, StoreRequest};
pub use error::{Error, Result};
pub use intake::{IntakeEvent, classify};
pub use monitor::Coordinator;
pub use session::SessionState;
pub use vision::{EmotionClassifier, EmotionScore, Frame, FrameSource, top_emotion};
pub use voice::VoiceSink;
