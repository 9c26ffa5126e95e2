//! System prompts and fixed replies

use super::session::Preferences;

/// Classifies a chat message into mood/genre, or asks for what is missing
pub const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are a music therapy assistant named MELODY 🎶.
- Keep every response safe and neutral so it does not trigger content filtering.
- If the user has not provided both a mood and a genre, ask for the missing one(s) in one friendly sentence.
- Once both are known (from the message or the current preferences), reply with exactly:
Mood: [mood]
Genre: [genre]
- Avoid flagged words or phrases. Keep language clean, engaging, and positive."#;

/// Writes the numbered playlist
pub const PLAYLIST_SYSTEM_PROMPT: &str = r#"You are a music therapy assistant named MELODY 🎶. Your job is to create safe, fun, and engaging playlists.
- Do not use words that might trigger content filtering. Keep responses neutral and positive.
- Generate a 10-song playlist based on the user's mood and genre.
- Format the response as:
**🎵 Playlist: [Creative Playlist Name]**
1. [Song 1] - [Artist]
2. [Song 2] - [Artist]
...
10. [Song 10] - [Artist]"#;

/// Provider refused the classification
pub const FILTERED_REPLY: &str = "🎵 **Oops! Something went wrong.** Let's try again! Please share your mood and favorite genre, and I'll make a playlist for you. 😊";

/// Both markers present but unusable
pub const MALFORMED_REPLY: &str = "⚠️ I couldn't determine both mood and genre. Try again!";

/// Classification call itself failed
pub const CLASSIFY_FAILED_REPLY: &str =
    "⚠️ I'm having trouble understanding right now. Please tell me your mood and favorite genre again!";

/// Playlist generation failed or came back empty
pub const PLAYLIST_FAILED_REPLY: &str = "⚠️ Couldn't generate a playlist. Try again!";

/// Appended when the catalog playlist could not be created
pub const PUBLISH_FAILED_NOTICE: &str =
    "⚠️ Couldn't create a Spotify playlist, but here are the songs!";

pub fn classification_query(message: &str, preferences: &Preferences) -> String {
    format!(
        "User input: '{}'\nCurrent preferences: {}",
        message, preferences
    )
}

pub fn playlist_query(mood: &str, genre: &str) -> String {
    format!("Mood: {}, Genre: {}", mood, genre)
}

pub fn playlist_name(mood: &str, genre: &str) -> String {
    format!("{} {} Playlist", mood, genre)
}

/// Playlist text followed by exactly one of: share link, degraded notice
pub fn compose_reply(display_text: &str, share_url: Option<&str>) -> String {
    match share_url {
        Some(url) => format!("{}\n\n🎶 **Listen on Spotify:** {}", display_text, url),
        None => format!("{}\n\n{}", display_text, PUBLISH_FAILED_NOTICE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_link() {
        let reply = compose_reply("1. Happy - Pharrell Williams", Some("https://x/pl"));
        assert!(reply.starts_with("1. Happy - Pharrell Williams"));
        assert!(reply.ends_with("https://x/pl"));
        assert!(!reply.contains(PUBLISH_FAILED_NOTICE));
    }

    #[test]
    fn test_reply_without_link() {
        let reply = compose_reply("1. Happy - Pharrell Williams", None);
        assert!(reply.starts_with("1. Happy - Pharrell Williams"));
        assert!(reply.ends_with(PUBLISH_FAILED_NOTICE));
        assert!(!reply.contains("Listen on Spotify"));
    }

    #[test]
    fn test_classification_query_includes_snapshot() {
        let prefs = Preferences {
            mood: Some("happy".to_string()),
            genre: None,
        };
        let query = classification_query("I love jazz", &prefs);
        assert!(query.contains("'I love jazz'"));
        assert!(query.contains("mood=happy, genre=unknown"));
    }
}
