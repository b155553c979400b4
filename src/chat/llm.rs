//! Language-model seam for the chat service.

use super::models::{ChatMessage, Role};
use crate::config::{ApiSettings, ChatSettings};
use crate::error::{MedleyError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Something that can continue a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier for health output.
    fn name(&self) -> &str;

    /// Whether credentials are available.
    fn is_configured(&self) -> bool;

    /// Produce the next assistant reply for `history` (oldest first).
    async fn complete(&self, history: &[ChatMessage]) -> Result<String>;
}

/// Chat completions against an OpenAI-compatible endpoint.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    max_output_tokens: u32,
    temperature: f32,
    system_prompt: Option<String>,
    configured: bool,
}

impl OpenAiChatModel {
    pub fn new(api: &ApiSettings, chat: &ChatSettings) -> Self {
        Self {
            client: create_client(api),
            model: chat.model.clone(),
            max_output_tokens: chat.max_output_tokens,
            temperature: chat.temperature,
            system_prompt: chat.system_prompt.clone().filter(|p| !p.trim().is_empty()),
            configured: api.api_key().is_some(),
        }
    }

    fn build_messages(&self, history: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(history.len() + 1);

        if let Some(system) = &self.system_prompt {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()
                    .map_err(|e| MedleyError::Model(e.to_string()))?
                    .into(),
            );
        }

        for message in history {
            let entry: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| MedleyError::Model(e.to_string()))?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| MedleyError::Model(e.to_string()))?
                    .into(),
            };
            messages.push(entry);
        }

        Ok(messages)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    #[instrument(skip(self, history), fields(model = %self.model, messages = history.len()))]
    async fn complete(&self, history: &[ChatMessage]) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.build_messages(history)?)
            .max_completion_tokens(self.max_output_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| MedleyError::Model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MedleyError::Model(e.to_string()))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| MedleyError::Model("Empty response from model".to_string()))?;

        debug!("Model replied with {} chars", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_maps_roles() {
        let chat = ChatSettings {
            system_prompt: Some("Be brief.".into()),
            ..Default::default()
        };
        let model = OpenAiChatModel::new(&ApiSettings::default(), &chat);

        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let messages = model.build_messages(&history).unwrap();

        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_unconfigured_without_key() {
        let api = ApiSettings {
            api_key_env: "MEDLEY_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let model = OpenAiChatModel::new(&api, &ChatSettings::default());
        assert!(!model.is_configured());
        assert_eq!(model.name(), "gpt-4o-mini");
    }
}
