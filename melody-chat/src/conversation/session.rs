//! Per-conversation state
//!
//! Each chat channel/user pair gets its own [`Conversation`] behind its own
//! async mutex. The chat handler holds that lock for the whole request, so
//! messages within one conversation are processed one at a time while
//! separate conversations proceed independently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Mood and genre gathered so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub mood: Option<String>,
    pub genre: Option<String>,
}

impl Preferences {
    pub fn is_complete(&self) -> bool {
        self.mood.is_some() && self.genre.is_some()
    }
}

impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mood={}, genre={}",
            self.mood.as_deref().unwrap_or("unknown"),
            self.genre.as_deref().unwrap_or("unknown")
        )
    }
}

/// Where a conversation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    AwaitingPreferences,
    PreferencesComplete,
}

/// One conversation's mutable state
#[derive(Debug, Clone)]
pub struct Conversation {
    key: SessionKey,
    preferences: Preferences,
    state: ConversationState,
}

impl Conversation {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            preferences: Preferences::default(),
            state: ConversationState::AwaitingPreferences,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Record both preferences, replacing earlier values
    pub fn commit(&mut self, mood: String, genre: String) {
        self.preferences.mood = Some(mood);
        self.preferences.genre = Some(genre);
        self.state = ConversationState::PreferencesComplete;
    }
}

/// Conversation identity derived from the chat payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Used when the payload names neither channel nor user
    pub const DEFAULT: &'static str = "default";

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// `channel:user`, either part alone, or the default key
    pub fn from_parts(channel_id: Option<&str>, user_id: Option<&str>) -> Self {
        let channel = channel_id.map(str::trim).filter(|s| !s.is_empty());
        let user = user_id.map(str::trim).filter(|s| !s.is_empty());

        match (channel, user) {
            (Some(c), Some(u)) => Self(format!("{}:{}", c, u)),
            (Some(c), None) => Self(c.to_string()),
            (None, Some(u)) => Self(u.to_string()),
            (None, None) => Self(Self::DEFAULT.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory conversation registry
///
/// Nothing is persisted; a restart forgets every conversation.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Arc<Mutex<Conversation>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the conversation for `key`, creating it on first use
    pub async fn conversation(&self, key: &SessionKey) -> Arc<Mutex<Conversation>> {
        if let Some(existing) = self.sessions.read().await.get(key) {
            return existing.clone();
        }

        self.sessions
            .write()
            .await
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(key.clone()))))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
