//! Combining separate video and audio files with ffmpeg.

use crate::error::{spawn_error, MedleyError, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument};

/// Input and output paths for a merge.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

impl MergeRequest {
    /// Build a request, adding `.mp4`/`.mp3`/`.mp4` to names that lack them.
    pub fn new(video: &str, audio: &str, output: &str) -> Self {
        Self {
            video: PathBuf::from(ensure_extension(video, "mp4")),
            audio: PathBuf::from(ensure_extension(audio, "mp3")),
            output: PathBuf::from(ensure_extension(output, "mp4")),
        }
    }

    fn ffmpeg_args(&self) -> Vec<&OsStr> {
        vec![
            OsStr::new("-i"),
            self.video.as_os_str(),
            OsStr::new("-i"),
            self.audio.as_os_str(),
            OsStr::new("-c:v"),
            OsStr::new("copy"),
            OsStr::new("-c:a"),
            OsStr::new("aac"),
            OsStr::new("-strict"),
            OsStr::new("experimental"),
            OsStr::new("-y"),
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            self.output.as_os_str(),
        ]
    }
}

/// Append `.ext` unless `name` already ends with it (ignoring case).
pub fn ensure_extension(name: &str, ext: &str) -> String {
    let name = name.trim();
    let suffix = format!(".{}", ext.trim_start_matches('.'));
    if name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Mux the video stream with a re-encoded audio stream into `output`.
#[instrument(skip_all, fields(output = %request.output.display()))]
pub async fn merge_video_audio(request: &MergeRequest) -> Result<PathBuf> {
    for (label, path) in [("Video", &request.video), ("Audio", &request.audio)] {
        if !path.is_file() {
            return Err(MedleyError::NotFound(format!(
                "{} file {}",
                label,
                path.display()
            )));
        }
    }

    if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let result = Command::new("ffmpeg")
        .args(request.ffmpeg_args())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| spawn_error("ffmpeg", e))?;

    if !result.status.success() {
        let err = String::from_utf8_lossy(&result.stderr);
        return Err(MedleyError::ToolFailed(format!(
            "ffmpeg merge failed: {}",
            err.trim()
        )));
    }

    info!("Merged into {}", request.output.display());
    Ok(request.output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension("clip", "mp4"), "clip.mp4");
        assert_eq!(ensure_extension("clip.MP4", "mp4"), "clip.MP4");
        assert_eq!(ensure_extension("song.mp3 ", ".mp3"), "song.mp3");
        assert_eq!(ensure_extension("song.wav", "mp3"), "song.wav.mp3");
    }

    #[test]
    fn test_request_adds_extensions() {
        let request = MergeRequest::new("video", "audio.MP3", "out");
        assert_eq!(request.video, PathBuf::from("video.mp4"));
        assert_eq!(request.audio, PathBuf::from("audio.MP3"));
        assert_eq!(request.output, PathBuf::from("out.mp4"));

        let args: Vec<String> = request
            .ffmpeg_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.windows(2).any(|w| w == ["-strict", "experimental"]));
    }

    #[tokio::test]
    async fn test_merge_requires_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let request = MergeRequest {
            video: dir.path().join("missing.mp4"),
            audio: dir.path().join("missing.mp3"),
            output: dir.path().join("out.mp4"),
        };

        let err = merge_video_audio(&request).await.unwrap_err();
        assert!(matches!(err, MedleyError::NotFound(ref msg) if msg.starts_with("Video")));
        assert!(!request.output.exists());
    }
}
