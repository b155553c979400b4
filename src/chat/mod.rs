//! Conversational chat backend and its client.
//!
//! Messages are appended to a per-session record, the most recent window is
//! sent to an OpenAI-compatible model, and the reply is appended in turn.

mod client;
mod llm;
mod models;
mod service;
mod store;

pub use client::{append_transcript, default_session_id, ChatClient};
pub use llm::{ChatModel, OpenAiChatModel};
pub use models::{ChatMessage, Conversation, Role};
pub use service::{ChatReply, ChatRequest, ChatService, HealthReport};
pub use store::{open_store, ConversationStore, MemoryConversationStore, SqliteConversationStore};

#[cfg(test)]
pub(crate) use service::testing;
