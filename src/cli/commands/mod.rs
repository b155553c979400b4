//! CLI command implementations.

mod chat;
mod config;
mod dir;
mod doctor;
mod download;
mod grab;
mod merge;
mod serve;
mod speech;

pub use chat::run_chat;
pub use config::run_config;
pub use dir::run_dir;
pub use doctor::run_doctor;
pub use download::{run_download, run_reel, run_short};
pub use grab::run_grab;
pub use merge::run_merge;
pub use serve::run_serve;
pub use speech::run_speech;

use crate::cli::Output;
use crate::config::Settings;
use crate::media::{classify_link, DownloadEvent, DownloadRequest, LinkKind, YtDlp};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Cookie file configured for the platform of `url`.
pub(crate) fn cookies_for(settings: &Settings, url: &str) -> Option<PathBuf> {
    let configured = match classify_link(url) {
        LinkKind::YouTube | LinkKind::YouTubeShort => &settings.downloader.youtube_cookies,
        LinkKind::InstagramReel => &settings.downloader.instagram_cookies,
        LinkKind::Other => return None,
    };
    configured.as_deref().map(Settings::expand_path)
}

/// Run one yt-dlp download while drawing its progress.
pub(crate) async fn download_with_progress(
    ytdlp: &YtDlp,
    url: &str,
    request: &DownloadRequest,
    label: &str,
) -> crate::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let pb = Output::progress_bar(100, label);

    let download = ytdlp.download(url, request, Some(tx));
    tokio::pin!(download);

    let result = loop {
        tokio::select! {
            result = &mut download => break result,
            Some(event) = rx.recv() => show_event(&pb, event),
        }
    };
    while let Ok(event) = rx.try_recv() {
        show_event(&pb, event);
    }

    match &result {
        Ok(()) => pb.finish_with_message(format!("{} done", label)),
        Err(_) => pb.abandon_with_message(format!("{} failed", label)),
    }
    result
}

fn show_event(pb: &indicatif::ProgressBar, event: DownloadEvent) {
    match event {
        DownloadEvent::Progress(percent) => pb.set_position(percent.clamp(0.0, 100.0) as u64),
        DownloadEvent::Destination(path) => pb.set_message(path),
        DownloadEvent::Message(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookies_follow_platform() {
        let mut settings = Settings::default();
        settings.downloader.youtube_cookies = Some("/tmp/yt.txt".to_string());
        settings.downloader.instagram_cookies = Some("/tmp/ig.txt".to_string());

        assert_eq!(
            cookies_for(&settings, "https://youtu.be/abc"),
            Some(PathBuf::from("/tmp/yt.txt"))
        );
        assert_eq!(
            cookies_for(&settings, "https://www.instagram.com/reel/xyz"),
            Some(PathBuf::from("/tmp/ig.txt"))
        );
        assert_eq!(cookies_for(&settings, "https://vimeo.com/1"), None);
    }
}
