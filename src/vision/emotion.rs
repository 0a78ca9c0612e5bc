//! Facial emotion classification

use async_trait::async_trait;
use base64::Engine as _;

use super::camera::Frame;
use crate::{Error, Result};

/// A labeled emotion score from the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionScore {
    pub label: String,
    pub score: f32,
}

/// Classifies the dominant facial emotion in a frame
///
/// Returns label/score pairs; an empty result means no face was found.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Score emotions in one frame
    async fn classify(&self, frame: &Frame) -> Result<Vec<EmotionScore>>;
}

/// Pick the label with the maximum score
///
/// Ties keep the first label in classifier output order; the comparison
/// is strict, so a later equal score never displaces an earlier one.
#[must_use]
pub fn top_emotion(scores: &[EmotionScore]) -> Option<&EmotionScore> {
    let mut best: Option<&EmotionScore> = None;
    for candidate in scores {
        if best.is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best
}

/// Empathetic line for a dominant emotion label, if we have one
///
/// Labels outside the fixed set produce no speech.
#[must_use]
pub fn empathy_line(label: &str) -> Option<&'static str> {
    match label {
        "happy" => Some("You seem happy! Keep smiling!"),
        "sad" => Some("I see you're feeling sad."),
        "angry" => Some("I sense some frustration. Try to relax."),
        "disgust" => Some("It looks like something is bothering you."),
        "neutral" => Some("I see you are feeling neutral."),
        _ => None,
    }
}

/// Response schema expected from the emotion scoring endpoint
#[derive(serde::Deserialize)]
struct ScoreResponse {
    emotions: Vec<ScoreEntry>,
}

#[derive(serde::Deserialize)]
struct ScoreEntry {
    label: String,
    score: f32,
}

/// Emotion classifier backed by a vision inference endpoint
///
/// Posts the base64-encoded frame and expects label/score pairs back.
pub struct VisionEmotionClassifier {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl VisionEmotionClassifier {
    /// Create a classifier calling `url`
    #[must_use]
    pub fn new(url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }
}

#[async_trait]
impl EmotionClassifier for VisionEmotionClassifier {
    async fn classify(&self, frame: &Frame) -> Result<Vec<EmotionScore>> {
        #[derive(serde::Serialize)]
        struct ScoreRequest<'a> {
            image: &'a str,
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&frame.0);
        let request = ScoreRequest { image: &encoded };

        let response = self
            .client
            .post(&self.url)
            .timeout(std::time::Duration::from_secs(30))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Vision(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Vision(format!("emotion API error {status}: {body}")));
        }

        let result: ScoreResponse = response
            .json()
            .await
            .map_err(|e| Error::Vision(e.to_string()))?;

        let scores = result
            .emotions
            .into_iter()
            .map(|entry| EmotionScore {
                label: entry.label,
                score: entry.score,
            })
            .collect();

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f32)]) -> Vec<EmotionScore> {
        pairs
            .iter()
            .map(|(label, score)| EmotionScore {
                label: (*label).to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn test_top_emotion_picks_max() {
        let scores = scores(&[("sad", 0.2), ("happy", 0.7), ("neutral", 0.1)]);
        assert_eq!(top_emotion(&scores).unwrap().label, "happy");
    }

    #[test]
    fn test_top_emotion_tie_keeps_first() {
        let scores = scores(&[("angry", 0.5), ("happy", 0.5)]);
        assert_eq!(top_emotion(&scores).unwrap().label, "angry");
    }

    #[test]
    fn test_top_emotion_empty_is_none() {
        assert!(top_emotion(&[]).is_none());
    }

    #[test]
    fn test_empathy_lines() {
        assert!(empathy_line("happy").unwrap().contains("smiling"));
        assert!(empathy_line("sad").unwrap().contains("sad"));
        assert!(empathy_line("angry").unwrap().contains("relax"));
        assert!(empathy_line("disgust").unwrap().contains("bothering"));
        assert!(empathy_line("neutral").unwrap().contains("neutral"));
        // Outside the fixed set: stay quiet
        assert!(empathy_line("surprise").is_none());
        assert!(empathy_line("fear").is_none());
    }
}
