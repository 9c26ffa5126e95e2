//! Mood/genre extraction from a classification reply
//!
//! The classifier is prompted to answer `Mood: <mood>\nGenre: <genre>` once
//! it knows both, and to ask a follow-up question otherwise. Markers match
//! case-insensitively.

const FILTERED_MARKER: &str = "blocked by content filtering";
const MOOD_MARKER: &str = "mood:";
const GENRE_MARKER: &str = "genre:";

/// Result of reading a classification reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Both fields present and non-empty
    Complete { mood: String, genre: String },
    /// A marker or a value is missing; carries the reply unchanged so it can
    /// be shown to the user as the clarifying question
    Incomplete(String),
    /// Provider refused the content
    Filtered,
    /// Both markers present but not in a splittable arrangement
    Malformed,
}

/// Classify a generated reply into preferences
pub fn extract_preferences(text: &str) -> Extraction {
    // ASCII lowering keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();

    if lowered.contains(FILTERED_MARKER) {
        return Extraction::Filtered;
    }

    let (mood_at, genre_at) = match (lowered.find(MOOD_MARKER), lowered.find(GENRE_MARKER)) {
        (Some(m), Some(g)) => (m, g),
        _ => return Extraction::Incomplete(text.to_string()),
    };

    let mood_start = mood_at + MOOD_MARKER.len();
    if genre_at < mood_start {
        return Extraction::Malformed;
    }

    let mood = text[mood_start..genre_at].trim();
    let genre = text[genre_at + GENRE_MARKER.len()..].trim();

    if mood.is_empty() || genre.is_empty() {
        return Extraction::Incomplete(text.to_string());
    }

    Extraction::Complete {
        mood: mood.to_string(),
        genre: genre.to_string(),
    }
}
