//! Media downloading through yt-dlp.
//!
//! Metadata comes from `yt-dlp --dump-json`, the format list is classified by
//! [`FormatCatalog`], and downloads are delegated back to yt-dlp. Merging of
//! separately downloaded streams goes through ffmpeg.

mod formats;
mod merge;
mod selection;
mod ytdlp;

pub use formats::{is_plausible_size, readable_size, FormatCatalog, FormatDescriptor, RawFormat};
pub use merge::{ensure_extension, merge_video_audio, MergeRequest};
pub use selection::{
    format_selector, output_template, parse_selection, quality_options, sanitize_filename,
    DownloadKind, Quality,
};
pub use ytdlp::{DownloadEvent, DownloadRequest, YtDlp};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Metadata for a single video as reported by yt-dlp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub formats: Vec<RawFormat>,
}

impl VideoInfo {
    /// Title, or a placeholder when yt-dlp reported none.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Classify this video's formats.
    pub fn catalog(&self) -> FormatCatalog {
        FormatCatalog::classify(&self.formats)
    }
}

/// Platforms with dedicated download presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    YouTube,
    YouTubeShort,
    InstagramReel,
    Other,
}

fn youtube_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?P<path>watch\?|shorts/|embed/|live/)|youtu\.be/)")
            .expect("Invalid regex")
    })
}

fn instagram_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.)?instagram\.com/(?:reels?|p)/[A-Za-z0-9_-]+")
            .expect("Invalid regex")
    })
}

/// Guess which platform a link points to.
pub fn classify_link(url: &str) -> LinkKind {
    let url = url.trim();
    if let Some(caps) = youtube_regex().captures(url) {
        return match caps.name("path").map(|m| m.as_str()) {
            Some("shorts/") => LinkKind::YouTubeShort,
            _ => LinkKind::YouTube,
        };
    }
    if instagram_regex().is_match(url) {
        return LinkKind::InstagramReel;
    }
    LinkKind::Other
}

/// Check that the input looks like an http(s) URL.
pub fn validate_url(input: &str) -> crate::Result<url::Url> {
    let input = input.trim();
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let parsed = url::Url::parse(&candidate)
        .map_err(|e| crate::MedleyError::InvalidInput(format!("Invalid URL '{}': {}", input, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(crate::MedleyError::InvalidInput(format!(
            "Unsupported URL: {}",
            input
        ))),
    }
}
