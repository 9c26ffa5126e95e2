//! HTTP API handlers

pub mod auth;
pub mod chat;
pub mod health;

pub use auth::{auth_routes, authorize, callback};
pub use chat::{chat, chat_routes, ChatMessage, ChatReply};
pub use health::{health_check, health_routes};
