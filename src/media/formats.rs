//! Format classification for yt-dlp format lists.
//!
//! Splits the raw format list into combined, video-only and audio-only buckets,
//! flags combined streams that are implausibly small for their resolution, and
//! exposes the set of identifiers a user may pick from.

use serde::{Deserialize, Serialize};

const MIB: f64 = 1024.0 * 1024.0;

/// Minimum plausible size (MiB) of a combined stream, keyed by height in pixels.
const MIN_SIZE_BY_HEIGHT: [(u32, f64); 8] = [
    (144, 0.5),
    (240, 1.0),
    (360, 2.0),
    (480, 3.0),
    (720, 5.0),
    (1080, 8.0),
    (1440, 12.0),
    (2160, 20.0),
];

/// Minimum size (MiB) for streams below the smallest table entry.
const MIN_SIZE_FALLBACK: f64 = 2.0;

/// A format entry as reported by `yt-dlp --dump-json`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
    pub format_note: Option<String>,
}

impl RawFormat {
    /// yt-dlp reports a missing stream as the literal codec "none".
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    /// Exact or approximate size in bytes, if known and non-zero.
    pub fn size_bytes(&self) -> Option<u64> {
        self.filesize
            .filter(|s| *s > 0.0)
            .or(self.filesize_approx.filter(|s| *s > 0.0))
            .map(|s| s as u64)
    }
}

/// A classified, displayable format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDescriptor {
    pub id: String,
    pub ext: String,
    /// `WxH` when both dimensions are known, otherwise the quality note.
    pub resolution: String,
    pub width: u32,
    pub height: u32,
    pub filesize: u64,
    pub size_label: String,
    pub note: String,
}

impl FormatDescriptor {
    fn from_raw(raw: &RawFormat) -> Option<Self> {
        let id = raw.format_id.as_deref().filter(|id| !id.is_empty())?;
        let filesize = raw.size_bytes()?;
        let width = raw.width.unwrap_or(0);
        let height = raw.height.unwrap_or(0);
        let note = raw.format_note.as_deref().unwrap_or_default().to_lowercase();

        let resolution = if width > 0 && height > 0 {
            format!("{}x{}", width, height)
        } else {
            note.clone()
        };

        Some(Self {
            id: id.to_string(),
            ext: raw.ext.clone().unwrap_or_else(|| "unknown".to_string()),
            resolution,
            width,
            height,
            filesize,
            size_label: readable_size(filesize),
            note,
        })
    }

    fn dimension_key(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Formats grouped the way they are offered to the user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatCatalog {
    /// Combined streams that pass the size check.
    pub allowed: Vec<FormatDescriptor>,
    /// Combined streams that are listed but may not be downloaded.
    pub blocked: Vec<FormatDescriptor>,
    /// Video-only streams, one per resolution.
    pub video_only: Vec<FormatDescriptor>,
    /// Audio-only streams without a low/tiny quality note.
    pub audio_only: Vec<FormatDescriptor>,
}

impl FormatCatalog {
    /// Classify a raw format list.
    pub fn classify(formats: &[RawFormat]) -> Self {
        let mut catalog = FormatCatalog::default();

        for raw in formats {
            let Some(info) = FormatDescriptor::from_raw(raw) else {
                continue;
            };

            match (raw.has_video(), raw.has_audio()) {
                (true, true) => {
                    if is_plausible_size(info.filesize, info.height) {
                        catalog.allowed.push(info);
                    } else {
                        catalog.blocked.push(info);
                    }
                }
                (true, false) => {
                    let key = info.dimension_key();
                    match catalog
                        .video_only
                        .iter_mut()
                        .find(|existing| existing.dimension_key() == key)
                    {
                        Some(existing) if info.filesize > existing.filesize => *existing = info,
                        Some(_) => {}
                        None => catalog.video_only.push(info),
                    }
                }
                (false, true) => {
                    if info.note.contains("low") || info.note.contains("tiny") {
                        continue;
                    }
                    catalog.audio_only.push(info);
                }
                (false, false) => {}
            }
        }

        catalog.allowed.sort_by(|a, b| b.height.cmp(&a.height));
        catalog.blocked.sort_by(|a, b| b.height.cmp(&a.height));
        catalog.video_only.sort_by(|a, b| b.height.cmp(&a.height));
        catalog.audio_only.sort_by(|a, b| b.filesize.cmp(&a.filesize));

        catalog
    }

    /// Identifiers that may be selected for download, in display order.
    pub fn valid_ids(&self) -> Vec<&str> {
        self.allowed
            .iter()
            .chain(&self.video_only)
            .chain(&self.audio_only)
            .map(|f| f.id.as_str())
            .collect()
    }

    pub fn is_valid(&self, id: &str) -> bool {
        self.valid_ids().contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
            && self.blocked.is_empty()
            && self.video_only.is_empty()
            && self.audio_only.is_empty()
    }

    /// Sections in display order: (title, formats, downloadable).
    pub fn sections(&self) -> [(&'static str, &[FormatDescriptor], bool); 4] {
        [
            ("Video + Audio (Allowed)", self.allowed.as_slice(), true),
            ("Video + Audio (Blocked)", self.blocked.as_slice(), false),
            ("Video Only", self.video_only.as_slice(), true),
            ("Audio Only", self.audio_only.as_slice(), true),
        ]
    }
}

/// Whether a combined stream is large enough for its resolution.
///
/// Unknown size or height is never plausible.
pub fn is_plausible_size(filesize: u64, height: u32) -> bool {
    if filesize == 0 || height == 0 {
        return false;
    }

    let min_mib = MIN_SIZE_BY_HEIGHT
        .iter()
        .rev()
        .find(|(res, _)| height >= *res)
        .map(|(_, mib)| *mib)
        .unwrap_or(MIN_SIZE_FALLBACK);

    filesize as f64 >= min_mib * MIB
}

/// Human readable size with binary units, e.g. `8.00 MB`.
pub fn readable_size(bytes: u64) -> String {
    if bytes == 0 {
        return "Unknown".to_string();
    }

    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combined(id: &str, height: u32, size: f64) -> RawFormat {
        RawFormat {
            format_id: Some(id.to_string()),
            ext: Some("mp4".to_string()),
            vcodec: Some("avc1".to_string()),
            acodec: Some("mp4a".to_string()),
            width: Some(height * 16 / 9),
            height: Some(height),
            filesize: Some(size),
            ..Default::default()
        }
    }

    fn video_only(id: &str, width: u32, height: u32, size: f64) -> RawFormat {
        RawFormat {
            format_id: Some(id.to_string()),
            ext: Some("webm".to_string()),
            vcodec: Some("vp9".to_string()),
            acodec: Some("none".to_string()),
            width: Some(width),
            height: Some(height),
            filesize: Some(size),
            ..Default::default()
        }
    }

    fn audio_only(id: &str, note: &str, size: f64) -> RawFormat {
        RawFormat {
            format_id: Some(id.to_string()),
            ext: Some("m4a".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("mp4a".to_string()),
            filesize: Some(size),
            format_note: Some(note.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_1080p_threshold_is_inclusive() {
        let exact = combined("a", 1080, 8.0 * MIB);
        let short = combined("b", 1080, 7.9 * MIB);

        let catalog = FormatCatalog::classify(&[exact, short]);

        assert_eq!(catalog.allowed.len(), 1);
        assert_eq!(catalog.allowed[0].id, "a");
        assert_eq!(catalog.blocked.len(), 1);
        assert_eq!(catalog.blocked[0].id, "b");
    }

    #[test]
    fn test_threshold_uses_largest_matching_height() {
        // 1200p falls in the 1080 bucket
        assert!(is_plausible_size((8.0 * MIB) as u64, 1200));
        assert!(!is_plausible_size((11.0 * MIB) as u64, 1440));
        assert!(is_plausible_size((20.0 * MIB) as u64, 4320));
        // Below the smallest key the fallback minimum applies
        assert!(!is_plausible_size((1.5 * MIB) as u64, 100));
        assert!(is_plausible_size((2.0 * MIB) as u64, 100));
        assert!(!is_plausible_size(0, 720));
        assert!(!is_plausible_size(100 * MIB as u64, 0));
    }

    #[test]
    fn test_video_only_dedup_keeps_largest() {
        let formats = vec![
            video_only("137", 1920, 1080, 50.0 * MIB),
            video_only("248", 1920, 1080, 70.0 * MIB),
            video_only("399", 1920, 1080, 60.0 * MIB),
            video_only("136", 1280, 720, 30.0 * MIB),
        ];

        let catalog = FormatCatalog::classify(&formats);

        assert_eq!(catalog.video_only.len(), 2);
        assert_eq!(catalog.video_only[0].id, "248");
        assert_eq!(catalog.video_only[1].id, "136");
    }

    #[test]
    fn test_video_only_tie_keeps_first() {
        let formats = vec![
            video_only("first", 640, 360, 5.0 * MIB),
            video_only("second", 640, 360, 5.0 * MIB),
        ];
        let catalog = FormatCatalog::classify(&formats);
        assert_eq!(catalog.video_only.len(), 1);
        assert_eq!(catalog.video_only[0].id, "first");
    }

    #[test]
    fn test_low_and_tiny_audio_dropped() {
        let formats = vec![
            audio_only("139", "Low", 1.0 * MIB),
            audio_only("599", "ultralow, tiny", 0.5 * MIB),
            audio_only("140", "medium", 3.0 * MIB),
            audio_only("251", "medium", 4.0 * MIB),
        ];

        let catalog = FormatCatalog::classify(&formats);
        let ids: Vec<&str> = catalog.audio_only.iter().map(|f| f.id.as_str()).collect();

        assert_eq!(ids, vec!["251", "140"]);
    }

    #[test]
    fn test_missing_id_or_size_discarded() {
        let mut no_id = combined("x", 720, 10.0 * MIB);
        no_id.format_id = None;
        let mut no_size = combined("y", 720, 10.0 * MIB);
        no_size.filesize = None;
        let mut approx = combined("z", 720, 0.0);
        approx.filesize = None;
        approx.filesize_approx = Some(6.0 * MIB);

        let catalog = FormatCatalog::classify(&[no_id, no_size, approx]);

        assert_eq!(catalog.valid_ids(), vec!["z"]);
        assert!(catalog.blocked.is_empty());
    }

    #[test]
    fn test_neither_codec_is_dropped() {
        let storyboard = RawFormat {
            format_id: Some("sb0".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("none".to_string()),
            filesize: Some(1000.0),
            ..Default::default()
        };
        let catalog = FormatCatalog::classify(&[storyboard]);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_valid_ids_order_and_blocked_excluded() {
        let formats = vec![
            audio_only("140", "medium", 3.0 * MIB),
            combined("18", 360, 1.0 * MIB),
            combined("22", 720, 9.0 * MIB),
            video_only("137", 1920, 1080, 50.0 * MIB),
        ];

        let catalog = FormatCatalog::classify(&formats);

        assert_eq!(catalog.valid_ids(), vec!["22", "137", "140"]);
        assert!(!catalog.is_valid("18"));
        assert_eq!(catalog.blocked[0].id, "18");
    }

    #[test]
    fn test_resolution_falls_back_to_note() {
        let catalog = FormatCatalog::classify(&[audio_only("140", "Medium", 3.0 * MIB)]);
        assert_eq!(catalog.audio_only[0].resolution, "medium");
        assert_eq!(catalog.audio_only[0].size_label, "3.00 MB");
    }

    #[test]
    fn test_readable_size() {
        assert_eq!(readable_size(0), "Unknown");
        assert_eq!(readable_size(512), "512.00 B");
        assert_eq!(readable_size(1536), "1.50 KB");
        assert_eq!(readable_size(8 * 1024 * 1024), "8.00 MB");
        assert_eq!(readable_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_parse_ytdlp_format_json() {
        let json = r#"{
            "format_id": "22",
            "ext": "mp4",
            "vcodec": "avc1.64001F",
            "acodec": "mp4a.40.2",
            "width": 1280,
            "height": 720,
            "filesize": null,
            "filesize_approx": 12345678.9,
            "format_note": "720p"
        }"#;
        let raw: RawFormat = serde_json::from_str(json).unwrap();
        assert!(raw.has_video() && raw.has_audio());
        assert_eq!(raw.size_bytes(), Some(12345678));
    }
}
