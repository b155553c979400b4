//! Speech recognition.

use crate::config::{ApiSettings, SpeechSettings};
use crate::error::{MedleyError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// Recognized text and the language it was spoken in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    pub language: Option<String>,
}

impl Recognition {
    /// Build from raw service output; blank text means nothing was understood.
    pub fn from_parts(text: &str, language: Option<&str>) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MedleyError::UnrecognizedSpeech);
        }
        Ok(Self {
            text: text.to_string(),
            language: language
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        })
    }
}

/// Trait for speech recognizers.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, audio_path: &Path) -> Result<Recognition>;
}

/// Recognition through the OpenAI transcription endpoint.
pub struct WhisperRecognizer {
    client: Client<OpenAIConfig>,
    model: String,
    language: Option<String>,
}

impl WhisperRecognizer {
    pub fn new(api: &ApiSettings, speech: &SpeechSettings) -> Self {
        Self {
            client: create_client(api),
            model: speech.transcription_model.clone(),
            language: speech.language.clone().filter(|l| !l.is_empty()),
        }
    }
}

#[async_trait]
impl Recognizer for WhisperRecognizer {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn recognize(&self, audio_path: &Path) -> Result<Recognition> {
        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("speech.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| MedleyError::Speech(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| {
                MedleyError::Speech(format!(
                    "Could not request results from speech recognition service: {}",
                    e
                ))
            })?;

        debug!("Recognized {} chars in {}", response.text.len(), response.language);
        Recognition::from_parts(&response.text, Some(&response.language))
    }
}
