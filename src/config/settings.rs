//! Configuration settings for Medley.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub api: ApiSettings,
    pub chat: ChatSettings,
    pub store: StoreSettings,
    pub server: ServerSettings,
    pub downloader: DownloaderSettings,
    pub speech: SpeechSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.medley".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted model API settings shared by chat and speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of an OpenAI-compatible API. None uses the OpenAI default.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

impl ApiSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Chat backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model used for chat completions.
    pub model: String,
    /// Number of most recent messages sent to the model.
    pub history_window: usize,
    /// Maximum tokens in a generated reply.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional system prompt prepended to every request.
    pub system_prompt: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            history_window: 10,
            max_output_tokens: 500,
            temperature: 0.7,
            system_prompt: None,
        }
    }
}

/// Conversation store backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    #[default]
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreProvider::Sqlite),
            "memory" => Ok(StoreProvider::Memory),
            _ => Err(format!("Unknown store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreProvider::Sqlite => write!(f, "sqlite"),
            StoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Conversation store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: StoreProvider,
    /// Path to the SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Sqlite,
            sqlite_path: "~/.medley/conversations.db".to_string(),
        }
    }
}

/// HTTP chat backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerSettings {
    /// Base URL clients use to reach the backend.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Media downloader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderSettings {
    /// yt-dlp executable.
    pub ytdlp_binary: String,
    /// Default directory for downloads.
    pub output_dir: String,
    /// Cookie file passed to yt-dlp for YouTube URLs.
    pub youtube_cookies: Option<String>,
    /// Cookie file passed to yt-dlp for Instagram URLs.
    pub instagram_cookies: Option<String>,
    /// Container used when yt-dlp merges separate streams.
    pub merge_output_format: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            ytdlp_binary: "yt-dlp".to_string(),
            output_dir: ".".to_string(),
            youtube_cookies: Some("youtube_cookies.txt".to_string()),
            instagram_cookies: Some("instagram_cookies.txt".to_string()),
            merge_output_format: "mp4".to_string(),
        }
    }
}

/// Speech recognition and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Transcription model.
    pub transcription_model: String,
    /// Language hint for recognition (ISO-639-1). None lets the model detect it.
    pub language: Option<String>,
    /// Seconds of microphone audio captured per utterance.
    pub listen_seconds: u32,
    /// ffmpeg input format for the microphone (pulse, alsa, avfoundation, dshow).
    pub input_format: Option<String>,
    /// ffmpeg input device for the microphone.
    pub input_device: Option<String>,
    /// Online text-to-speech model.
    pub tts_model: String,
    /// Online text-to-speech voice.
    pub voice: String,
    /// Offline text-to-speech executable.
    pub offline_engine: String,
    /// Offline speaking rate (words per minute).
    pub offline_rate: u32,
    /// Offline volume (0.0-1.0).
    pub offline_volume: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            transcription_model: "whisper-1".to_string(),
            language: None,
            listen_seconds: 10,
            input_format: None,
            input_device: None,
            tts_model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            offline_engine: "espeak-ng".to_string(),
            offline_rate: 150,
            offline_volume: 0.9,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::MedleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medley")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Log level for the given `-v` count. Without the flag the configured level applies.
    pub fn log_level(&self, verbose: u8) -> &str {
        match verbose {
            0 => match self.general.log_level.trim().to_lowercase().as_str() {
                "trace" => "trace",
                "debug" => "debug",
                "info" => "info",
                "error" => "error",
                "off" => "off",
                _ => "warn",
            },
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.store.sqlite_path)
    }

    /// Get the expanded default download directory.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.downloader.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chat]
            model = "gemini-1.5-flash"

            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(settings.chat.model, "gemini-1.5-flash");
        assert_eq!(settings.chat.history_window, 10);
        assert_eq!(settings.chat.max_output_tokens, 500);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.store.provider, StoreProvider::Sqlite);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.speech.voice = "nova".to_string();
        settings.store.provider = StoreProvider::Memory;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.speech.voice, "nova");
        assert_eq!(loaded.store.provider, StoreProvider::Memory);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.downloader.merge_output_format, "mp4");
    }

    #[test]
    fn test_store_provider_parse() {
        assert_eq!("SQLite".parse::<StoreProvider>().unwrap(), StoreProvider::Sqlite);
        assert_eq!("memory".parse::<StoreProvider>().unwrap(), StoreProvider::Memory);
        assert!("mongo".parse::<StoreProvider>().is_err());
    }

    #[test]
    fn test_log_level_from_config_and_flags() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_level(0), "warn");

        settings.general.log_level = "DEBUG".to_string();
        assert_eq!(settings.log_level(0), "debug");
        assert_eq!(settings.log_level(1), "info");
        assert_eq!(settings.log_level(3), "trace");

        settings.general.log_level = "chatty".to_string();
        assert_eq!(settings.log_level(0), "warn");
    }

    #[test]
    fn test_server_base_url() {
        assert_eq!(ServerSettings::default().base_url(), "http://127.0.0.1:5000");
    }
}
