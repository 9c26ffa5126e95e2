//! Chat webhook endpoint
//!
//! Accepts Rocket.Chat outgoing-webhook payloads (only `text` is required)
//! and always answers 200 with `{"text": ...}`.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::conversation::SessionKey;
use crate::AppState;

/// Inbound chat message
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Rocket.Chat sends `false` or a bot descriptor object
    #[serde(default)]
    pub bot: Option<Value>,
}

impl ChatMessage {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::from_parts(self.channel_id.as_deref(), self.user_id.as_deref())
    }

    pub fn is_from_bot(&self) -> bool {
        !matches!(self.bot, None | Some(Value::Null) | Some(Value::Bool(false)))
    }
}

/// Outbound reply
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub text: String,
}

/// POST /
pub async fn chat(State(state): State<AppState>, Json(message): Json<ChatMessage>) -> Json<ChatReply> {
    let key = message.session_key();
    let span = info_span!("chat", request_id = %Uuid::new_v4(), session = %key);

    async move {
        if message.is_from_bot() {
            debug!("Ignoring bot message");
            return Json(ChatReply {
                text: String::new(),
            });
        }

        let text = message.text.trim();
        info!(user = ?message.user_name, chars = text.len(), "Chat message received");

        let conversation = state.sessions.conversation(&key).await;
        let mut conversation = conversation.lock().await;
        let reply = state.orchestrator.handle_message(text, &mut conversation).await;

        Json(ChatReply { text: reply })
    }
    .instrument(span)
    .await
}

/// Build chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/", post(chat))
}
