//! Conversation persistence.
//!
//! Provides a trait-based interface so the chat service can run against
//! SQLite in production and an in-memory map in tests.

mod memory;
mod sqlite;

pub use memory::MemoryConversationStore;
pub use sqlite::SqliteConversationStore;

use super::models::{ChatMessage, Conversation};
use crate::config::{Settings, StoreProvider};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for conversation store implementations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Short backend name for health output.
    fn name(&self) -> &'static str;

    /// Append a message, creating the session record on first use.
    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()>;

    /// Full record for a session.
    async fn get(&self, session_id: &str) -> Result<Option<Conversation>>;

    /// The last `limit` messages of a session, oldest first.
    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>>;

    /// Remove a session. Returns false when it did not exist.
    async fn clear(&self, session_id: &str) -> Result<bool>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Open the store selected in the settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn ConversationStore>> {
    match settings.store.provider {
        StoreProvider::Sqlite => Ok(Arc::new(SqliteConversationStore::new(
            &settings.sqlite_path(),
        )?)),
        StoreProvider::Memory => Ok(Arc::new(MemoryConversationStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::Role;

    async fn exercise(store: &dyn ConversationStore) {
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(store.recent_messages("s1", 10).await.unwrap().is_empty());

        store.append("s1", &ChatMessage::user("hello")).await.unwrap();
        store
            .append("s1", &ChatMessage::assistant("hi there"))
            .await
            .unwrap();
        store.append("s1", &ChatMessage::user("bye")).await.unwrap();
        store.append("s2", &ChatMessage::user("other")).await.unwrap();

        let conv = store.get("s1").await.unwrap().unwrap();
        assert_eq!(conv.session_id, "s1");
        let contents: Vec<&str> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "hi there", "bye"]);
        assert_eq!(conv.messages[1].role, Role::Assistant);

        let recent = store.recent_messages("s1", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "hi there");
        assert_eq!(recent[1].content, "bye");

        // The record id stays stable across appends.
        store.append("s1", &ChatMessage::user("again")).await.unwrap();
        let again = store.get("s1").await.unwrap().unwrap();
        assert_eq!(again.id, conv.id);
        assert_eq!(again.messages.len(), 4);

        assert!(store.clear("s1").await.unwrap());
        assert!(!store.clear("s1").await.unwrap());
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(store.get("s2").await.unwrap().is_some());

        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryConversationStore::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_store_in_memory() {
        exercise(&SqliteConversationStore::in_memory().unwrap()).await;
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("conversations.db");

        {
            let store = SqliteConversationStore::new(&path).unwrap();
            store.append("s1", &ChatMessage::user("kept")).await.unwrap();
        }

        let reopened = SqliteConversationStore::new(&path).unwrap();
        let conv = reopened.get("s1").await.unwrap().unwrap();
        assert_eq!(conv.messages[0].content, "kept");
    }

    #[test]
    fn test_open_store_memory() {
        let mut settings = Settings::default();
        settings.store.provider = StoreProvider::Memory;
        assert_eq!(open_store(&settings).unwrap().name(), "memory");
    }
}
