//! Saving recognized or typed text as audio or plain text.

use super::synth::SpeechSynthesizer;
use crate::error::{MedleyError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where a script ends up, chosen by file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// `.mp3`: synthesized speech.
    Audio(PathBuf),
    /// `.txt`: UTF-8 text.
    Text(PathBuf),
}

impl SaveTarget {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("mp3") => Ok(SaveTarget::Audio(path.to_path_buf())),
            Some("txt") => Ok(SaveTarget::Text(path.to_path_buf())),
            _ => Err(MedleyError::InvalidInput(format!(
                "Unsupported output file {}: use .mp3 or .txt",
                path.display()
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SaveTarget::Audio(p) | SaveTarget::Text(p) => p,
        }
    }
}

/// Write `text` to `target`, synthesizing speech for audio targets.
pub async fn save_script(
    text: &str,
    target: &SaveTarget,
    synth: &dyn SpeechSynthesizer,
) -> Result<PathBuf> {
    if let Some(parent) = target.path().parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match target {
        SaveTarget::Audio(path) => synth.synthesize_to_file(text, path).await?,
        SaveTarget::Text(path) => tokio::fs::write(path, text).await?,
    }

    info!("Saved script to {}", target.path().display());
    Ok(target.path().to_path_buf())
}

/// Read a text file to be spoken. Missing or blank files are errors.
pub fn read_script(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(MedleyError::NotFound(format!(
            "Text file {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(MedleyError::InvalidInput(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(text.to_string())
}
