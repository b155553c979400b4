//! Error types for Medley.

use thiserror::Error;

/// Library-level error type for Medley operations.
#[derive(Error, Debug)]
pub enum MedleyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media extraction failed: {0}")]
    Extraction(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Invalid format IDs: {}", .0.join(", "))]
    InvalidSelection(Vec<String>),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Could not understand the audio")]
    UnrecognizedSpeech,

    #[error("Conversation store error: {0}")]
    Store(String),

    #[error("GenAI API error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Medley operations.
pub type Result<T> = std::result::Result<T, MedleyError>;

/// Map a process spawn failure to the matching error variant.
pub(crate) fn spawn_error(tool: &str, err: std::io::Error) -> MedleyError {
    if err.kind() == std::io::ErrorKind::NotFound {
        MedleyError::ToolNotFound(tool.to_string())
    } else {
        MedleyError::ToolFailed(format!("{tool}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selection_lists_ids() {
        let err = MedleyError::InvalidSelection(vec!["22".into(), "abc".into()]);
        assert_eq!(err.to_string(), "Invalid format IDs: 22, abc");
    }

    #[test]
    fn test_spawn_error_not_found() {
        let err = spawn_error("yt-dlp", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, MedleyError::ToolNotFound(ref t) if t == "yt-dlp"));
    }
}
