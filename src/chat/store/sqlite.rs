//! SQLite-backed conversation store.

use super::ConversationStore;
use crate::chat::models::{ChatMessage, Conversation, Role};
use crate::error::{MedleyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS conversations (
        session_id TEXT PRIMARY KEY,
        id TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS messages (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES conversations(session_id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, seq);
"#;

/// SQLite conversation store.
pub struct SqliteConversationStore {
    conn: Mutex<Connection>,
}

impl SqliteConversationStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite conversation store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MedleyError::Store(format!("Failed to acquire lock: {}", e)))
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MedleyError::Store(format!("Corrupt timestamp '{}': {}", value, e)))
}

/// Raw `(role, content, timestamp)` columns, decoded after the query.
type MessageRow = (String, String, String);

fn read_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode_message((role, content, timestamp): MessageRow) -> Result<ChatMessage> {
    let role: Role = role.parse().map_err(MedleyError::Store)?;
    Ok(ChatMessage {
        role,
        content,
        timestamp: parse_time(&timestamp)?,
    })
}

fn decode_messages(rows: Vec<MessageRow>) -> Result<Vec<ChatMessage>> {
    rows.into_iter().map(decode_message).collect()
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self, message))]
    async fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO conversations (session_id, id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session_id,
                Uuid::new_v4().to_string(),
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.execute(
            "INSERT INTO messages (session_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id,
                message.role.as_str(),
                message.content,
                message.timestamp.to_rfc3339()
            ],
        )?;

        tx.commit()?;
        debug!("Appended {} message to {}", message.role, session_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, session_id: &str) -> Result<Option<Conversation>> {
        let conn = self.lock()?;

        let header = conn
            .query_row(
                "SELECT id, created_at FROM conversations WHERE session_id = ?1",
                params![session_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((id, created_at)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT role, content, timestamp FROM messages WHERE session_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![session_id], read_message_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| MedleyError::Store(format!("Corrupt conversation id '{}': {}", id, e)))?;

        Ok(Some(Conversation {
            id,
            session_id: session_id.to_string(),
            created_at: parse_time(&created_at)?,
            messages: decode_messages(rows)?,
        }))
    }

    #[instrument(skip(self))]
    async fn recent_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT role, content, timestamp FROM messages
            WHERE session_id = ?1
            ORDER BY seq DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt
            .query_map(params![session_id, limit as i64], read_message_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut messages = decode_messages(rows)?;
        messages.reverse();

        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn clear(&self, session_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        let removed = tx.execute(
            "DELETE FROM conversations WHERE session_id = ?1",
            params![session_id],
        )?;

        tx.commit()?;
        info!("Cleared session {}", session_id);
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
