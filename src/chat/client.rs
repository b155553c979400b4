//! HTTP client for a running chat server.

use super::models::Conversation;
use super::service::{ChatReply, ChatRequest, HealthReport};
use crate::error::{MedleyError, Result};
use chrono::Local;
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to the chat server's JSON API.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl ChatClient {
    /// Create a client for `base_url`, generating a session id when none is given.
    pub fn new(base_url: &str, session_id: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| MedleyError::InvalidInput(format!("Invalid server URL '{}': {}", base_url, e)))?;

        Ok(Self {
            http,
            base_url,
            session_id: session_id
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_session_id),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MedleyError::InvalidInput(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| MedleyError::InvalidInput(format!("Invalid server URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one message and return the assistant's reply.
    #[instrument(skip(self, message))]
    pub async fn send_message(&self, message: &str) -> Result<ChatReply> {
        let body = ChatRequest {
            session_id: Some(self.session_id.clone()),
            message: Some(message.to_string()),
        };

        let response = self
            .http
            .post(self.endpoint(&["chat"])?)
            .json(&body)
            .send()
            .await?;

        decode(response).await
    }

    /// Fetch this session's stored conversation.
    pub async fn history(&self) -> Result<Conversation> {
        let response = self
            .http
            .get(self.endpoint(&["history", &self.session_id])?)
            .send()
            .await?;

        decode(response).await
    }

    /// Ask the server for its health report.
    pub async fn health(&self) -> Result<HealthReport> {
        let response = self
            .http
            .get(self.endpoint(&["health"])?)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await.unwrap_or_default();
    debug!("Server returned {}: {}", status, text);
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);

    Err(match status {
        reqwest::StatusCode::NOT_FOUND => MedleyError::NotFound(detail),
        reqwest::StatusCode::BAD_REQUEST => MedleyError::InvalidInput(detail),
        _ => MedleyError::Server {
            status: status.as_u16(),
            message: detail,
        },
    })
}

/// Session id of the form `session_YYYYMMDD_HHMMSS`.
pub fn default_session_id() -> String {
    format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Append one exchange to a plain-text transcript.
pub fn append_transcript(path: &Path, user: &str, assistant: &str) -> Result<()> {
    use std::io::Write;

    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    writeln!(file, "[{}] User: {}", stamp, user)?;
    writeln!(file, "[{}] AI: {}", stamp, assistant)?;
    writeln!(file, "{}", "-".repeat(50))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::EchoModel;
    use crate::chat::{ChatService, MemoryConversationStore};
    use std::sync::Arc;

    #[test]
    fn test_default_session_id_shape() {
        let id = default_session_id();
        assert!(id.starts_with("session_"));
        assert_eq!(id.len(), "session_20240101_120000".len());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = ChatClient::new("http://localhost:5000/", Some("abc".into())).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.session_id(), "abc");

        let generated = ChatClient::new("http://localhost:5000", Some("  ".into())).unwrap();
        assert!(generated.session_id().starts_with("session_"));
    }

    #[test]
    fn test_append_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");

        append_transcript(&path, "hi", "hello").unwrap();
        append_transcript(&path, "bye", "see you").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().next().unwrap().ends_with("User: hi"));
        assert!(text.contains("AI: see you"));
    }

    #[test]
    fn test_endpoint_escapes_session_id() {
        let client = ChatClient::new("http://localhost:5000", Some("team/a?b#c".into())).unwrap();
        let url = client.endpoint(&["history", client.session_id()]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/history/team%2Fa%3Fb%23c");

        let nested = ChatClient::new("http://localhost:5000/api/", None).unwrap();
        assert_eq!(
            nested.endpoint(&["health"]).unwrap().as_str(),
            "http://localhost:5000/api/health"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            ChatClient::new("not a url", None),
            Err(MedleyError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_history_roundtrip_with_unusual_session_ids() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let service = ChatService::new(
            Arc::new(MemoryConversationStore::new()),
            Arc::new(EchoModel::working()),
            10,
        );
        tokio::spawn(async move {
            axum::serve(listener, crate::server::router(service)).await.unwrap();
        });

        let base = format!("http://{}", addr);
        for session in ["team/alpha", "q?x=1", "a#b", "100% done"] {
            let client = ChatClient::new(&base, Some(session.to_string())).unwrap();
            client.send_message("hello").await.unwrap();

            let conversation = client.history().await.unwrap();
            assert_eq!(conversation.session_id, session);
            assert_eq!(conversation.messages.len(), 2);
            assert_eq!(conversation.messages[0].content, "hello");
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let client = ChatClient::new("http://127.0.0.1:9", None).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, MedleyError::Http(_)));
    }
}
