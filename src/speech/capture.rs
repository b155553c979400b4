//! Microphone capture through ffmpeg.

use crate::config::SpeechSettings;
use crate::error::{spawn_error, MedleyError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Records short mono clips from the default input device.
#[derive(Debug, Clone)]
pub struct MicCapture {
    input_format: String,
    input_device: String,
    seconds: u32,
}

/// Platform default ffmpeg input format and device.
pub fn default_input() -> (&'static str, &'static str) {
    if cfg!(target_os = "macos") {
        ("avfoundation", ":0")
    } else if cfg!(target_os = "windows") {
        ("dshow", "audio=default")
    } else {
        ("pulse", "default")
    }
}

impl MicCapture {
    pub fn new(settings: &SpeechSettings) -> Self {
        let (format, device) = default_input();
        Self {
            input_format: settings
                .input_format
                .clone()
                .unwrap_or_else(|| format.to_string()),
            input_device: settings
                .input_device
                .clone()
                .unwrap_or_else(|| device.to_string()),
            seconds: settings.listen_seconds.max(1),
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    fn args(&self, seconds: u32, dest: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.input_format.clone(),
            "-i".to_string(),
            self.input_device.clone(),
            "-t".to_string(),
            seconds.to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-ar".to_string(),
            "16000".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            dest.to_string_lossy().into_owned(),
        ]
    }

    /// Record the configured number of seconds into a WAV file at `dest`.
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn record(&self, dest: &Path) -> Result<PathBuf> {
        self.record_for(self.seconds, dest).await
    }

    async fn record_for(&self, seconds: u32, dest: &Path) -> Result<PathBuf> {
        debug!(
            "Recording {}s from {} {}",
            seconds, self.input_format, self.input_device
        );

        let result = Command::new("ffmpeg")
            .args(self.args(seconds, dest))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error("ffmpeg", e))?;

        if !result.status.success() {
            let err = String::from_utf8_lossy(&result.stderr);
            return Err(MedleyError::Speech(format!(
                "Microphone capture failed: {}",
                err.trim()
            )));
        }

        let captured = dest.metadata().map(|m| m.len()).unwrap_or(0);
        if captured == 0 {
            return Err(MedleyError::Speech(
                "Microphone produced no audio".to_string(),
            ));
        }

        info!("Captured {} bytes of audio", captured);
        Ok(dest.to_path_buf())
    }

    /// Check that the input device can be opened by recording one second.
    pub async fn test(&self) -> Result<()> {
        let dir = tempfile::tempdir()?;
        self.record_for(1, &dir.path().join("mic-test.wav")).await?;
        Ok(())
    }
}
