//! Chat request handling shared by the HTTP server.

use super::llm::ChatModel;
use super::models::{ChatMessage, Conversation};
use super::store::ConversationStore;
use crate::error::{MedleyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Reply to `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub store: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Appends messages, calls the model, and records its reply.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ChatModel>,
    history_window: usize,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ChatModel>,
        history_window: usize,
    ) -> Self {
        Self {
            store,
            model,
            history_window: history_window.max(1),
        }
    }

    /// Handle one chat turn.
    #[instrument(skip(self, request))]
    pub async fn send(&self, request: ChatRequest) -> Result<ChatReply> {
        let (session_id, message) = match (request.session_id, request.message) {
            (Some(session_id), Some(message)) => (session_id, message),
            _ => {
                return Err(MedleyError::InvalidInput(
                    "Missing session_id or message".to_string(),
                ))
            }
        };
        if session_id.trim().is_empty() || message.trim().is_empty() {
            return Err(MedleyError::InvalidInput(
                "session_id and message cannot be empty".to_string(),
            ));
        }
        if !self.model.is_configured() {
            return Err(MedleyError::Config("Model API not configured".to_string()));
        }

        self.store
            .append(&session_id, &ChatMessage::user(message))
            .await?;

        let history = self
            .store
            .recent_messages(&session_id, self.history_window)
            .await?;

        // The user message stays stored even when the model call fails.
        let response = self.model.complete(&history).await.map_err(|e| {
            warn!("Model call failed for {}: {}", session_id, e);
            match e {
                MedleyError::Model(_) => e,
                other => MedleyError::Model(other.to_string()),
            }
        })?;

        self.store
            .append(&session_id, &ChatMessage::assistant(response.clone()))
            .await?;

        info!("Answered session {}", session_id);
        Ok(ChatReply {
            session_id,
            response,
            timestamp: Utc::now(),
        })
    }

    /// Full record of a session.
    pub async fn history(&self, session_id: &str) -> Result<Conversation> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| MedleyError::NotFound("Session not found".to_string()))
    }

    /// Delete a session.
    pub async fn clear(&self, session_id: &str) -> Result<()> {
        if self.store.clear(session_id).await? {
            Ok(())
        } else {
            Err(MedleyError::NotFound("Session not found".to_string()))
        }
    }

    pub async fn health(&self) -> HealthReport {
        let store = match self.store.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                warn!("Store ping failed: {}", e);
                "disconnected"
            }
        };
        let model = if self.model.is_configured() {
            "configured"
        } else {
            "not configured"
        };

        HealthReport {
            status: "healthy".to_string(),
            store: format!("{} ({})", store, self.store.name()),
            model: format!("{} ({})", model, self.model.name()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Model double that echoes the last message or fails on demand.
    pub struct EchoModel {
        pub configured: bool,
        pub fail: bool,
        pub seen: Mutex<Vec<usize>>,
    }

    impl EchoModel {
        pub fn working() -> Self {
            Self {
                configured: true,
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, history: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(history.len());
            if self.fail {
                return Err(MedleyError::Model("quota exceeded".to_string()));
            }
            let last = history.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(format!("echo: {}", last))
        }
    }
}
