//! melody-chat library - chat-driven playlist assistant
//!
//! Collects a user's mood and genre over chat, has a language model write a
//! themed playlist, resolves it against the music catalog and publishes it
//! as a public playlist on the configured owner account.

pub mod api;
pub mod catalog;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod pipeline;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::catalog::AccountAuthorization;
use crate::conversation::{ConversationOrchestrator, SessionStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub sessions: SessionStore,
    /// Owner consent flow for the catalog account
    pub authorization: Arc<dyn AccountAuthorization>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<ConversationOrchestrator>,
        authorization: Arc<dyn AccountAuthorization>,
    ) -> Self {
        Self {
            orchestrator,
            sessions: SessionStore::new(),
            authorization,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::chat_routes())
        .merge(api::auth_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
