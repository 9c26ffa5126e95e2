//! Conversation orchestration
//!
//! One inbound message → one reply. The orchestrator classifies the message,
//! and once mood and genre are both known it generates a playlist, resolves
//! it against the catalog and publishes it, all within the same request.
//! Every failure path ends in a user-visible reply.

pub mod prompts;
pub mod session;

pub use session::{Conversation, ConversationState, Preferences, SessionKey, SessionStore};

use crate::generation::{GenerationRequest, SamplingParams, TextGenerator};
use crate::pipeline::{
    extract_preferences, Extraction, PlaylistDraft, PlaylistPublisher, TrackResolver,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the classification → playlist → catalog pipeline
pub struct ConversationOrchestrator {
    generator: Arc<dyn TextGenerator>,
    sampling: SamplingParams,
    resolver: TrackResolver,
    publisher: PlaylistPublisher,
}

impl ConversationOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        sampling: SamplingParams,
        resolver: TrackResolver,
        publisher: PlaylistPublisher,
    ) -> Self {
        Self {
            generator,
            sampling,
            resolver,
            publisher,
        }
    }

    /// Process one message against its conversation and produce the reply
    pub async fn handle_message(&self, message: &str, conversation: &mut Conversation) -> String {
        let query = prompts::classification_query(message, conversation.preferences());
        let classified = match self
            .generate(prompts::CLASSIFY_SYSTEM_PROMPT, query, conversation.key())
            .await
        {
            Some(text) => text,
            None => return prompts::CLASSIFY_FAILED_REPLY.to_string(),
        };

        let (mood, genre) = match extract_preferences(&classified) {
            Extraction::Complete { mood, genre } => (mood, genre),
            Extraction::Incomplete(question) => {
                debug!(session = %conversation.key(), "Preferences incomplete, asking user");
                return question;
            }
            Extraction::Filtered => {
                warn!(session = %conversation.key(), "Classification blocked by content filter");
                return prompts::FILTERED_REPLY.to_string();
            }
            Extraction::Malformed => {
                warn!(session = %conversation.key(), reply = %classified, "Unparseable classification");
                return prompts::MALFORMED_REPLY.to_string();
            }
        };

        info!(session = %conversation.key(), mood = %mood, genre = %genre, "Preferences complete");
        conversation.commit(mood.clone(), genre.clone());

        let draft = match self
            .generate(
                prompts::PLAYLIST_SYSTEM_PROMPT,
                prompts::playlist_query(&mood, &genre),
                conversation.key(),
            )
            .await
        {
            Some(text) => PlaylistDraft::from_text(text),
            None => return prompts::PLAYLIST_FAILED_REPLY.to_string(),
        };

        if draft.entries.is_empty() {
            warn!(session = %conversation.key(), "No songs parsed from generated playlist");
        }

        let tracks = self.resolver.resolve(&draft.entries).await;
        let share_url = self
            .publisher
            .publish(&prompts::playlist_name(&mood, &genre), &tracks)
            .await;

        prompts::compose_reply(&draft.display_text, share_url.as_deref())
    }

    /// Run one generation call; `None` on any failure or empty output
    async fn generate(&self, system: &str, query: String, key: &SessionKey) -> Option<String> {
        let request = GenerationRequest {
            system: system.to_string(),
            query,
            session_id: format!("melody-{}", key),
            sampling: self.sampling.clone(),
        };

        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!(session = %key, "Generation returned empty text");
                None
            }
            Err(e) => {
                warn!(session = %key, error = %e, "Generation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        CatalogError, NewPlaylist, PlaylistRecord, PlaylistStore, TrackRecord, TrackSearch,
    };
    use crate::generation::GenerationError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const PLAYLIST_TEXT: &str = "**🎵 Playlist: Smooth Evening**\n\
                                 1. So What - Miles Davis\n\
                                 2. Take Five - Dave Brubeck\n\
                                 3. Unknown Tune - Nobody";

    /// Replays scripted answers and records the requests it saw
    struct ScriptedGenerator {
        answers: Mutex<VecDeque<Result<String, GenerationError>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn new(answers: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::Empty))
        }
    }

    struct FakeCatalog {
        publish_fails: bool,
        searches: Mutex<usize>,
        added: Mutex<Vec<String>>,
        names: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn new(publish_fails: bool) -> Arc<Self> {
            Arc::new(Self {
                publish_fails,
                searches: Mutex::new(0),
                added: Mutex::new(Vec::new()),
                names: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TrackSearch for FakeCatalog {
        async fn search_tracks(
            &self,
            title: &str,
            _artist: &str,
            _limit: u32,
        ) -> Result<Vec<TrackRecord>, CatalogError> {
            *self.searches.lock().unwrap() += 1;
            if title == "Unknown Tune" {
                return Ok(Vec::new());
            }
            Ok(vec![TrackRecord {
                id: title.to_string(),
                uri: format!("spotify:track:{}", title.replace(' ', "")),
                name: title.to_string(),
            }])
        }
    }

    #[async_trait]
    impl PlaylistStore for FakeCatalog {
        async fn create_playlist(
            &self,
            playlist: &NewPlaylist<'_>,
        ) -> Result<PlaylistRecord, CatalogError> {
            if self.publish_fails {
                return Err(CatalogError::NotAuthorized);
            }
            self.names.lock().unwrap().push(playlist.name.to_string());
            Ok(PlaylistRecord {
                id: "pl-9".to_string(),
                share_url: Some("https://open.spotify.com/playlist/pl-9".to_string()),
            })
        }

        async fn add_items(&self, _playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
            self.added.lock().unwrap().extend_from_slice(uris);
            Ok(())
        }
    }

    fn orchestrator(
        generator: Arc<ScriptedGenerator>,
        catalog: Arc<FakeCatalog>,
    ) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            generator,
            SamplingParams::default(),
            TrackResolver::new(catalog.clone()),
            PlaylistPublisher::new(catalog, "helloniam".to_string(), "desc".to_string()),
        )
    }

    fn conversation() -> Conversation {
        Conversation::new(SessionKey::new("room:user"))
    }

    #[tokio::test]
    async fn test_full_pipeline_with_share_link() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Mood: relaxed\nGenre: jazz".to_string()),
            Ok(PLAYLIST_TEXT.to_string()),
        ]);
        let catalog = FakeCatalog::new(false);
        let orch = orchestrator(generator.clone(), catalog.clone());
        let mut conv = conversation();

        let reply = orch.handle_message("I feel relaxed, love jazz", &mut conv).await;

        assert!(reply.starts_with(PLAYLIST_TEXT));
        assert!(reply.contains("https://open.spotify.com/playlist/pl-9"));
        assert!(!reply.contains(prompts::PUBLISH_FAILED_NOTICE));
        assert_eq!(conv.state(), ConversationState::PreferencesComplete);
        assert_eq!(conv.preferences().mood.as_deref(), Some("relaxed"));

        assert_eq!(*catalog.searches.lock().unwrap(), 3);
        assert_eq!(
            *catalog.added.lock().unwrap(),
            vec!["spotify:track:SoWhat", "spotify:track:TakeFive"]
        );
        assert_eq!(*catalog.names.lock().unwrap(), vec!["relaxed jazz Playlist"]);

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system, prompts::CLASSIFY_SYSTEM_PROMPT);
        assert!(requests[0].query.contains("I feel relaxed, love jazz"));
        assert_eq!(requests[1].system, prompts::PLAYLIST_SYSTEM_PROMPT);
        assert_eq!(requests[1].query, "Mood: relaxed, Genre: jazz");
        assert_eq!(requests[0].session_id, "melody-room:user");
    }

    #[tokio::test]
    async fn test_publish_failure_still_shows_songs() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Mood: relaxed\nGenre: jazz".to_string()),
            Ok(PLAYLIST_TEXT.to_string()),
        ]);
        let orch = orchestrator(generator, FakeCatalog::new(true));
        let mut conv = conversation();

        let reply = orch.handle_message("I feel relaxed, love jazz", &mut conv).await;

        assert!(reply.starts_with(PLAYLIST_TEXT));
        assert!(reply.ends_with(prompts::PUBLISH_FAILED_NOTICE));
        assert!(!reply.contains("Listen on Spotify"));
    }

    #[tokio::test]
    async fn test_incomplete_passes_question_through() {
        let question = "Sounds lovely! What genre would you like?";
        let generator = ScriptedGenerator::new(vec![Ok(question.to_string())]);
        let catalog = FakeCatalog::new(false);
        let orch = orchestrator(generator.clone(), catalog.clone());
        let mut conv = conversation();

        let reply = orch.handle_message("I'm happy", &mut conv).await;

        assert_eq!(reply, question);
        assert_eq!(conv.state(), ConversationState::AwaitingPreferences);
        assert_eq!(generator.requests.lock().unwrap().len(), 1);
        assert_eq!(*catalog.searches.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_filtered_returns_retry_prompt() {
        let generator = ScriptedGenerator::new(vec![Ok(
            "Response Blocked By Content Filtering".to_string()
        )]);
        let orch = orchestrator(generator, FakeCatalog::new(false));
        let mut conv = conversation();

        let reply = orch.handle_message("...", &mut conv).await;

        assert_eq!(reply, prompts::FILTERED_REPLY);
        assert_eq!(conv.state(), ConversationState::AwaitingPreferences);
    }

    #[tokio::test]
    async fn test_malformed_returns_fixed_error() {
        let generator = ScriptedGenerator::new(vec![Ok("Genre: pop\nMood: happy".to_string())]);
        let orch = orchestrator(generator, FakeCatalog::new(false));
        let mut conv = conversation();

        let reply = orch.handle_message("pop, happy", &mut conv).await;

        assert_eq!(reply, prompts::MALFORMED_REPLY);
        assert!(!conv.preferences().is_complete());
    }

    #[tokio::test]
    async fn test_classification_failure_still_answers() {
        let generator = ScriptedGenerator::new(vec![Err(GenerationError::Timeout)]);
        let orch = orchestrator(generator, FakeCatalog::new(false));
        let mut conv = conversation();

        let reply = orch.handle_message("hello", &mut conv).await;

        assert_eq!(reply, prompts::CLASSIFY_FAILED_REPLY);
    }

    #[tokio::test]
    async fn test_playlist_generation_failure_keeps_preferences() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Mood: happy\nGenre: pop".to_string()),
            Err(GenerationError::Empty),
        ]);
        let catalog = FakeCatalog::new(false);
        let orch = orchestrator(generator, catalog.clone());
        let mut conv = conversation();

        let reply = orch.handle_message("happy pop please", &mut conv).await;

        assert_eq!(reply, prompts::PLAYLIST_FAILED_REPLY);
        assert_eq!(conv.state(), ConversationState::PreferencesComplete);
        assert_eq!(*catalog.searches.lock().unwrap(), 0);
        assert!(catalog.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_playlist_still_publishes_empty() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Mood: happy\nGenre: pop".to_string()),
            Ok("Here are some ideas, no list today.".to_string()),
        ]);
        let catalog = FakeCatalog::new(false);
        let orch = orchestrator(generator, catalog.clone());
        let mut conv = conversation();

        let reply = orch.handle_message("happy pop", &mut conv).await;

        assert!(reply.starts_with("Here are some ideas, no list today."));
        assert!(reply.contains("Listen on Spotify"));
        assert_eq!(catalog.names.lock().unwrap().len(), 1);
        assert!(catalog.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_reaches_second_message() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Mood: happy\nGenre: pop".to_string()),
            Ok(PLAYLIST_TEXT.to_string()),
            Ok("Want another one?".to_string()),
        ]);
        let orch = orchestrator(generator.clone(), FakeCatalog::new(false));
        let mut conv = conversation();

        orch.handle_message("happy pop", &mut conv).await;
        orch.handle_message("thanks!", &mut conv).await;

        let requests = generator.requests.lock().unwrap();
        assert!(requests[2].query.contains("mood=happy, genre=pop"));
        // Preferences survive a non-classifying reply
        assert_eq!(conv.state(), ConversationState::PreferencesComplete);
    }
}
