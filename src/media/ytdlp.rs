//! yt-dlp process wrapper.

use super::VideoInfo;
use crate::error::{spawn_error, MedleyError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Progress reported while yt-dlp runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Percentage of the current stream, 0-100.
    Progress(f64),
    /// Destination file announced by yt-dlp.
    Destination(String),
    /// Any other line of output.
    Message(String),
}

/// Options for a single yt-dlp download.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Value for `-f`.
    pub format: String,
    /// Value for `-o`.
    pub output_template: String,
    /// Container used when separate streams are merged.
    pub merge_output_format: Option<String>,
    pub no_playlist: bool,
    pub cookies: Option<PathBuf>,
}

impl DownloadRequest {
    pub fn new(format: impl Into<String>, output_template: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            output_template: output_template.into(),
            merge_output_format: Some("mp4".to_string()),
            no_playlist: false,
            cookies: None,
        }
    }

    /// One specific format ID, saved as `<title>_<id>.<ext>` in `dir`.
    pub fn single_format(format_id: &str, dir: &Path) -> Self {
        let template = dir.join(format!("%(title)s_{}.%(ext)s", format_id));
        Self::new(format_id, template.to_string_lossy())
    }

    /// Best video and audio of a YouTube Short.
    pub fn youtube_short(dir: &Path) -> Self {
        let template = dir.join("%(title)s_short.%(ext)s");
        Self::new("bestvideo+bestaudio/best", template.to_string_lossy()).with_no_playlist()
    }

    /// Best single-file format of an Instagram reel.
    pub fn instagram_reel(dir: &Path) -> Self {
        let template = dir.join("%(title)s_reel.%(ext)s");
        Self::new("best", template.to_string_lossy())
    }

    pub fn with_no_playlist(mut self) -> Self {
        self.no_playlist = true;
        self
    }

    pub fn with_merge_format(mut self, format: Option<String>) -> Self {
        self.merge_output_format = format.filter(|f| !f.is_empty());
        self
    }

    /// Attach a cookie file, ignoring it when it does not exist.
    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies.filter(|path| {
            let exists = path.exists();
            if !exists {
                debug!("Cookie file {:?} not found, continuing without it", path);
            }
            exists
        });
        self
    }

    /// Arguments passed to yt-dlp, excluding the URL.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            self.output_template.clone(),
            "--newline".to_string(),
            "--no-warnings".to_string(),
        ];
        if let Some(merge) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(merge.clone());
        }
        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if let Some(cookies) = &self.cookies {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args
    }
}

/// Handle to the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Fetch metadata and the format list without downloading.
    #[instrument(skip(self, cookies))]
    pub async fn fetch_info(&self, url: &str, cookies: Option<&Path>) -> Result<VideoInfo> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--dump-json", "--no-download", "--no-warnings", "--no-playlist"]);
        if let Some(path) = cookies.filter(|p| p.exists()) {
            cmd.arg("--cookies").arg(path);
        }
        cmd.arg(url);

        let output = cmd
            .output()
            .await
            .map_err(|e| spawn_error(&self.binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MedleyError::Extraction(format!(
                "yt-dlp could not read {}: {}",
                url,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| MedleyError::Extraction("yt-dlp returned no metadata".to_string()))?;

        let info: VideoInfo = serde_json::from_str(json).map_err(|e| {
            MedleyError::Extraction(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        info!("Fetched {} formats for {}", info.formats.len(), info.id);
        Ok(info)
    }

    /// Download `url`, forwarding progress lines to `events` if given.
    #[instrument(skip(self, request, events), fields(format = %request.format))]
    pub async fn download(
        &self,
        url: &str,
        request: &DownloadRequest,
        events: Option<UnboundedSender<DownloadEvent>>,
    ) -> Result<()> {
        info!("Downloading {} with format {}", url, request.format);

        let mut child = Command::new(&self.binary)
            .args(request.args())
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&self.binary, e))?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                let event = parse_progress_line(&line);
                debug!(?event, "yt-dlp");
                if let Some(tx) = &events {
                    let _ = tx.send(event);
                }
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            warn!("yt-dlp exited with {}", status);
            return Err(MedleyError::Download(format!(
                "yt-dlp failed for format {}: {}",
                request.format,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").expect("Invalid regex"))
}

/// Interpret one line of yt-dlp `--newline` output.
pub(crate) fn parse_progress_line(line: &str) -> DownloadEvent {
    let line = line.trim();

    if let Some(caps) = progress_regex().captures(line) {
        if let Ok(pct) = caps[1].parse::<f64>() {
            return DownloadEvent::Progress(pct.clamp(0.0, 100.0));
        }
    }

    for prefix in ["[download] Destination: ", "[Merger] Merging formats into "] {
        if let Some(dest) = line.strip_prefix(prefix) {
            return DownloadEvent::Destination(dest.trim_matches('"').to_string());
        }
    }

    DownloadEvent::Message(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(
            parse_progress_line("[download]  42.3% of   10.00MiB at    1.00MiB/s ETA 00:06"),
            DownloadEvent::Progress(42.3)
        );
        assert_eq!(
            parse_progress_line("[download] 100% of 3.27MiB in 00:00:02"),
            DownloadEvent::Progress(100.0)
        );
        assert_eq!(
            parse_progress_line("[download] Destination: /tmp/Clip_22.mp4"),
            DownloadEvent::Destination("/tmp/Clip_22.mp4".to_string())
        );
        assert_eq!(
            parse_progress_line("[Merger] Merging formats into \"Clip.mp4\""),
            DownloadEvent::Destination("Clip.mp4".to_string())
        );
        assert!(matches!(
            parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage"),
            DownloadEvent::Message(_)
        ));
    }

    #[test]
    fn test_request_args() {
        let dir = Path::new("/out");
        let request = DownloadRequest::youtube_short(dir);
        let args = request.args();

        assert_eq!(args[0..2], ["-f", "bestvideo+bestaudio/best"]);
        assert_eq!(args[3], "/out/%(title)s_short.%(ext)s");
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.windows(2).any(|w| w == ["--merge-output-format", "mp4"]));
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_single_format_template() {
        let request = DownloadRequest::single_format("137", Path::new("media"));
        assert_eq!(request.format, "137");
        assert_eq!(request.output_template, "media/%(title)s_137.%(ext)s");
        assert!(!request.no_playlist);
    }

    #[test]
    fn test_cookies_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("cookies.txt");
        std::fs::write(&present, "# Netscape HTTP Cookie File\n").unwrap();

        let with = DownloadRequest::instagram_reel(dir.path()).with_cookies(Some(present.clone()));
        assert_eq!(with.cookies.as_deref(), Some(present.as_path()));
        assert!(with.args().contains(&"--cookies".to_string()));

        let without = DownloadRequest::instagram_reel(dir.path())
            .with_cookies(Some(dir.path().join("missing.txt")));
        assert!(without.cookies.is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let ytdlp = YtDlp::new("medley-test-no-such-binary");
        let err = ytdlp
            .fetch_info("https://example.com/video", None)
            .await
            .unwrap_err();
        assert!(matches!(err, MedleyError::ToolNotFound(_)));
    }
}
