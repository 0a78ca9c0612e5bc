//! Camera frames and facial emotion classification

pub mod camera;
pub mod emotion;

pub use camera::{Frame, FrameSource, SnapshotCamera};
pub use emotion::{
    EmotionClassifier, EmotionScore, VisionEmotionClassifier, empathy_line, top_emotion,
};
