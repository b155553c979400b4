//! In-memory conversation store.
//!
//! Useful for testing and throwaway servers.

use super::ConversationStore;
use crate::chat::models::{ChatMessage, Conversation};
use crate::error::{MedleyError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory conversation store.
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> MedleyError {
    MedleyError::Store(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let mut conversations = self.conversations.write().map_err(poisoned)?;
        conversations
            .entry(session_id.to_string())
            .or_insert_with(|| Conversation::new(session_id))
            .messages
            .push(message.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Conversation>> {
        let conversations = self.conversations.read().map_err(poisoned)?;
        Ok(conversations.get(session_id).cloned())
    }

    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let conversations = self.conversations.read().map_err(poisoned)?;
        Ok(conversations
            .get(session_id)
            .map(|c| c.recent(limit).to_vec())
            .unwrap_or_default())
    }

    async fn clear(&self, session_id: &str) -> Result<bool> {
        let mut conversations = self.conversations.write().map_err(poisoned)?;
        Ok(conversations.remove(session_id).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
