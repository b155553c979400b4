//! OpenAI-compatible client configuration.

use crate::config::ApiSettings;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client from the API settings.
///
/// The key is read from the configured environment variable so that hosted
/// OpenAI-compatible endpoints (Gemini, local gateways) work the same way.
pub fn create_client(api: &ApiSettings) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::new();
    if let Some(key) = api.api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = api.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(api.timeout_secs))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(config: OpenAIConfig, timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    Client::with_config(config).with_http_client(http_client)
}
