//! Utterance classification for food/water intake tracking
//!
//! Pure keyword classifier: maps a transcribed statement to an intake
//! event. Rules are checked in strict priority order and the first match
//! wins, so a status request containing the word "food" is still a
//! status request.

/// Keywords indicating food intake
const FOOD_KEYWORDS: &[&str] = &[
    "ate",
    "food",
    "meal",
    "snack",
    "breakfast",
    "lunch",
    "dinner",
];

/// Keywords indicating water intake
const WATER_KEYWORDS: &[&str] = &["water", "drank", "drink", "hydration"];

/// Classified outcome of one spoken statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeEvent {
    /// Patient asked for their stored record
    Details,
    /// Patient asked for the in-memory counters
    Status,
    /// Food intake; `allergy_warning` set when the statement mentions a
    /// configured allergic food
    Food { allergy_warning: bool },
    /// Water intake
    Water,
    /// Statement matched no rule
    Unrecognized,
}

/// Classify a transcribed statement
///
/// Matching is case-insensitive. Command phrases and allergen tokens are
/// substring matches; intake keywords match whole words so that "water"
/// does not trip the food keyword "ate". Priority order: details, status,
/// food, water. Allergy tokens are trimmed and empty tokens ignored, so a
/// trailing comma in the configured list is harmless.
#[must_use]
pub fn classify(utterance: &str, allergic_foods: &[String]) -> IntakeEvent {
    let statement = utterance.to_lowercase();

    if statement.contains("show my details") {
        return IntakeEvent::Details;
    }

    if statement.contains("show my status") {
        return IntakeEvent::Status;
    }

    let words: Vec<&str> = statement
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if FOOD_KEYWORDS.iter().any(|word| words.contains(word)) {
        let allergy_warning = allergic_foods
            .iter()
            .map(|food| food.trim().to_lowercase())
            .filter(|food| !food.is_empty())
            .any(|food| statement.contains(&food));
        return IntakeEvent::Food { allergy_warning };
    }

    if WATER_KEYWORDS.iter().any(|word| words.contains(word)) {
        return IntakeEvent::Water;
    }

    IntakeEvent::Unrecognized
}
