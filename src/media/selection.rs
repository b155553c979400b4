//! Turning user choices into yt-dlp format selectors.

use super::formats::{FormatCatalog, RawFormat};
use crate::error::{MedleyError, Result};
use std::path::Path;

/// Parse a comma-separated list of format IDs and check each against the catalog.
///
/// Every unknown ID is reported at once; nothing is returned unless the whole
/// selection is valid.
pub fn parse_selection(input: &str, catalog: &FormatCatalog) -> Result<Vec<String>> {
    let selected: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if selected.is_empty() {
        return Err(MedleyError::InvalidInput("No format IDs selected".to_string()));
    }

    let invalid: Vec<String> = selected
        .iter()
        .filter(|id| !catalog.is_valid(id))
        .cloned()
        .collect();

    if !invalid.is_empty() {
        return Err(MedleyError::InvalidSelection(invalid));
    }

    Ok(selected)
}

/// Which streams to fetch in a quality-driven download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadKind {
    #[default]
    Both,
    Video,
    Audio,
}

impl std::str::FromStr for DownloadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" => Ok(DownloadKind::Both),
            "video" => Ok(DownloadKind::Video),
            "audio" => Ok(DownloadKind::Audio),
            _ => Err(format!("Unknown download type: {}. Use both, video, or audio.", s)),
        }
    }
}

impl std::fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadKind::Both => write!(f, "both"),
            DownloadKind::Video => write!(f, "video"),
            DownloadKind::Audio => write!(f, "audio"),
        }
    }
}

/// Requested quality in a quality-driven download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Best,
    Height(u32),
    AudioBest,
}

impl std::str::FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "best" | "best available" => Ok(Quality::Best),
            "audio" | "audio best" => Ok(Quality::AudioBest),
            other => other
                .strip_suffix('p')
                .unwrap_or(other)
                .parse::<u32>()
                .ok()
                .filter(|h| *h > 0)
                .map(Quality::Height)
                .ok_or_else(|| format!("Unknown quality: {}", s)),
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Best => write!(f, "Best available"),
            Quality::Height(h) => write!(f, "{}p", h),
            Quality::AudioBest => write!(f, "Audio best"),
        }
    }
}

/// Quality choices for a video: best, each distinct video height (descending), audio.
pub fn quality_options(formats: &[RawFormat]) -> Vec<Quality> {
    let mut heights: Vec<u32> = formats
        .iter()
        .filter(|f| f.vcodec.as_deref().is_some_and(|c| c != "none"))
        .filter_map(|f| f.height.filter(|h| *h > 0))
        .collect();
    heights.sort_unstable_by(|a, b| b.cmp(a));
    heights.dedup();

    let mut options = Vec::with_capacity(heights.len() + 2);
    options.push(Quality::Best);
    options.extend(heights.into_iter().map(Quality::Height));
    options.push(Quality::AudioBest);
    options
}

/// Build the yt-dlp `-f` selector for a kind/quality pair.
pub fn format_selector(kind: DownloadKind, quality: Quality) -> String {
    match (kind, quality) {
        (DownloadKind::Audio, _) | (_, Quality::AudioBest) => "bestaudio/best".to_string(),
        (DownloadKind::Both, Quality::Best) => "bestvideo+bestaudio/best".to_string(),
        (DownloadKind::Both, Quality::Height(h)) => {
            format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
        }
        (DownloadKind::Video, Quality::Best) => "bestvideo".to_string(),
        (DownloadKind::Video, Quality::Height(h)) => format!("bestvideo[height<={h}]"),
    }
}

/// Output template inside `dir`, using `filename` or the video title.
pub fn output_template(dir: &Path, filename: Option<&str>) -> String {
    let name = match filename.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{}.%(ext)s", name),
        None => "%(title)s.%(ext)s".to_string(),
    };
    dir.join(name).to_string_lossy().into_owned()
}

/// Strip a title down to characters that are safe in a file name.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FormatCatalog {
        let mib = 1024.0 * 1024.0;
        FormatCatalog::classify(&[
            RawFormat {
                format_id: Some("22".into()),
                vcodec: Some("avc1".into()),
                acodec: Some("mp4a".into()),
                width: Some(1280),
                height: Some(720),
                filesize: Some(20.0 * mib),
                ..Default::default()
            },
            RawFormat {
                format_id: Some("18".into()),
                vcodec: Some("avc1".into()),
                acodec: Some("mp4a".into()),
                width: Some(640),
                height: Some(360),
                filesize: Some(0.5 * mib),
                ..Default::default()
            },
            RawFormat {
                format_id: Some("140".into()),
                vcodec: Some("none".into()),
                acodec: Some("mp4a".into()),
                filesize: Some(3.0 * mib),
                format_note: Some("medium".into()),
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_selection_accepts_valid_ids() {
        let ids = parse_selection(" 22, 140 ,", &catalog()).unwrap();
        assert_eq!(ids, vec!["22", "140"]);
    }

    #[test]
    fn test_selection_rejects_unknown_and_blocked() {
        let err = parse_selection("22,18,999", &catalog()).unwrap_err();
        match err {
            MedleyError::InvalidSelection(ids) => assert_eq!(ids, vec!["18", "999"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_selection_rejects_empty() {
        assert!(matches!(
            parse_selection(" , ", &catalog()),
            Err(MedleyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_quality_options() {
        let formats = vec![
            RawFormat {
                vcodec: Some("vp9".into()),
                height: Some(720),
                ..Default::default()
            },
            RawFormat {
                vcodec: Some("avc1".into()),
                height: Some(1080),
                ..Default::default()
            },
            RawFormat {
                vcodec: Some("avc1".into()),
                height: Some(720),
                ..Default::default()
            },
            RawFormat {
                vcodec: Some("none".into()),
                height: Some(2160),
                ..Default::default()
            },
            RawFormat {
                vcodec: None,
                height: Some(480),
                ..Default::default()
            },
        ];

        let labels: Vec<String> = quality_options(&formats)
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(labels, vec!["Best available", "1080p", "720p", "Audio best"]);
    }

    #[test]
    fn test_format_selector() {
        assert_eq!(
            format_selector(DownloadKind::Both, Quality::Best),
            "bestvideo+bestaudio/best"
        );
        assert_eq!(
            format_selector(DownloadKind::Both, Quality::Height(720)),
            "bestvideo[height<=720]+bestaudio/best[height<=720]"
        );
        assert_eq!(format_selector(DownloadKind::Video, Quality::Best), "bestvideo");
        assert_eq!(
            format_selector(DownloadKind::Video, Quality::Height(480)),
            "bestvideo[height<=480]"
        );
        assert_eq!(
            format_selector(DownloadKind::Audio, Quality::Height(480)),
            "bestaudio/best"
        );
        assert_eq!(
            format_selector(DownloadKind::Both, Quality::AudioBest),
            "bestaudio/best"
        );
    }

    #[test]
    fn test_parse_quality_and_kind() {
        assert_eq!("Best available".parse::<Quality>().unwrap(), Quality::Best);
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::Height(1080));
        assert_eq!("720".parse::<Quality>().unwrap(), Quality::Height(720));
        assert_eq!("audio best".parse::<Quality>().unwrap(), Quality::AudioBest);
        assert!("huge".parse::<Quality>().is_err());
        assert!("0p".parse::<Quality>().is_err());

        assert_eq!("VIDEO".parse::<DownloadKind>().unwrap(), DownloadKind::Video);
        assert!("both-ish".parse::<DownloadKind>().is_err());
    }

    #[test]
    fn test_output_template() {
        let dir = Path::new("/downloads");
        assert_eq!(
            output_template(dir, Some("clip")),
            "/downloads/clip.%(ext)s"
        );
        assert_eq!(output_template(dir, Some("  ")), "/downloads/%(title)s.%(ext)s");
        assert_eq!(output_template(dir, None), "/downloads/%(title)s.%(ext)s");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("  Rust: The Book / Part #1 (2024)!  "),
            "Rust The Book  Part 1 2024"
        );
        assert_eq!(sanitize_filename("café_clip-01"), "café_clip-01");
    }
}
