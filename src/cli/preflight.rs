//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{MedleyError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Downloads need yt-dlp and ffmpeg for merging streams.
    Download,
    /// Merging only needs ffmpeg.
    Merge,
    /// Online speech needs ffmpeg for capture and the API key.
    Speech,
    /// Offline speech needs ffmpeg and the offline engine.
    OfflineSpeech,
    /// Serving chat needs the API key.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Download => {
            check_tool(&settings.downloader.ytdlp_binary)?;
            check_tool("ffmpeg")?;
        }
        Operation::Merge => {
            check_tool("ffmpeg")?;
        }
        Operation::Speech => {
            check_api_key(&settings.api.api_key_env)?;
            check_tool("ffmpeg")?;
        }
        Operation::OfflineSpeech => {
            check_tool("ffmpeg")?;
            check_tool(&settings.speech.offline_engine)?;
        }
        Operation::Serve => {
            check_api_key(&settings.api.api_key_env)?;
        }
    }
    Ok(())
}

/// Check that the API key variable is set.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(MedleyError::Config(format!(
            "{var} is empty. Set it with: export {var}='sk-...'"
        ))),
        Err(_) => Err(MedleyError::Config(format!(
            "{var} not set. Set it with: export {var}='sk-...'"
        ))),
    }
}

/// Check if an external tool is available.
pub(crate) fn check_tool(name: &str) -> Result<()> {
    // ffmpeg family uses -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" | "ffplay" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(MedleyError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MedleyError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(MedleyError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let err = check_tool("medley-no-such-tool").unwrap_err();
        assert!(matches!(err, MedleyError::ToolNotFound(ref t) if t == "medley-no-such-tool"));
    }

    #[test]
    fn test_missing_api_key_names_variable() {
        let err = check_api_key("MEDLEY_TEST_UNSET_KEY").unwrap_err();
        assert!(err.to_string().contains("MEDLEY_TEST_UNSET_KEY not set"));
    }

    #[test]
    fn test_serve_requires_key() {
        let mut settings = Settings::default();
        settings.api.api_key_env = "MEDLEY_TEST_UNSET_KEY".to_string();
        assert!(matches!(
            check(Operation::Serve, &settings),
            Err(MedleyError::Config(_))
        ));
    }
}
