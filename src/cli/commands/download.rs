//! Format-picking downloads plus the Short and Reel presets.

use super::{cookies_for, download_with_progress};
use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, Prompter};
use crate::config::Settings;
use crate::media::{parse_selection, validate_url, DownloadRequest, YtDlp};
use anyhow::Result;
use std::io::{BufRead, Write};

const MENU: &[&str] = &[
    "1. Download a video (pick formats)",
    "2. Download a YouTube Short",
    "3. Download an Instagram Reel",
    "4. Merge video and audio",
    "5. Exit",
];

/// Run the download command. Without a URL an interactive menu is shown.
pub async fn run_download(url: Option<&str>, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Download, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'medley doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let ytdlp = YtDlp::new(&settings.downloader.ytdlp_binary);
    let mut prompter = Prompter::stdio();

    if let Some(url) = url {
        return download_formats(&mut prompter, &ytdlp, url, settings).await;
    }

    loop {
        Output::header("Medley Downloader");
        for line in MENU {
            println!("  {}", line);
        }

        let Some(choice) = prompter.ask("\nEnter your choice (1-5): ")? else {
            break;
        };

        let outcome = match choice.as_str() {
            "1" => match ask_url(&mut prompter)? {
                Some(url) => download_formats(&mut prompter, &ytdlp, &url, settings).await,
                None => continue,
            },
            "2" => match ask_url(&mut prompter)? {
                Some(url) => short(&ytdlp, &url, settings).await,
                None => continue,
            },
            "3" => match ask_url(&mut prompter)? {
                Some(url) => reel(&ytdlp, &url, settings).await,
                None => continue,
            },
            "4" => super::merge::merge_interactive(&mut prompter, None, None, None).await,
            "5" => {
                Output::info("Goodbye!");
                break;
            }
            _ => {
                Output::warning("Invalid choice. Please enter a number between 1 and 5.");
                continue;
            }
        };

        if let Err(e) = outcome {
            Output::error(&format!("{}", e));
        }
    }

    Ok(())
}

/// Download a YouTube Short in the best quality.
pub async fn run_short(url: &str, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Download, settings)?;
    let ytdlp = YtDlp::new(&settings.downloader.ytdlp_binary);
    short(&ytdlp, url, settings).await
}

/// Download an Instagram reel.
pub async fn run_reel(url: &str, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Download, settings)?;
    let ytdlp = YtDlp::new(&settings.downloader.ytdlp_binary);
    reel(&ytdlp, url, settings).await
}

async fn short(ytdlp: &YtDlp, url: &str, settings: &Settings) -> Result<()> {
    let url = validate_url(url)?;
    let request = DownloadRequest::youtube_short(&output_dir(settings)?)
        .with_merge_format(Some(settings.downloader.merge_output_format.clone()))
        .with_cookies(cookies_for(settings, url.as_str()));

    download_with_progress(ytdlp, url.as_str(), &request, "Short").await?;
    Output::success("Short downloaded successfully.");
    Ok(())
}

async fn reel(ytdlp: &YtDlp, url: &str, settings: &Settings) -> Result<()> {
    let url = validate_url(url)?;
    let request = DownloadRequest::instagram_reel(&output_dir(settings)?)
        .with_merge_format(None)
        .with_cookies(cookies_for(settings, url.as_str()));

    download_with_progress(ytdlp, url.as_str(), &request, "Reel").await?;
    Output::success("Reel downloaded successfully.");
    Ok(())
}

/// List the formats of `url`, ask for IDs and download each one.
async fn download_formats<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    ytdlp: &YtDlp,
    url: &str,
    settings: &Settings,
) -> Result<()> {
    let url = validate_url(url)?;
    let cookies = cookies_for(settings, url.as_str());

    let spinner = Output::spinner("Fetching video information...");
    let info = ytdlp.fetch_info(url.as_str(), cookies.as_deref()).await;
    spinner.finish_and_clear();
    let info = info?;

    Output::header(info.display_title());
    if let Some(duration) = info.duration {
        Output::kv("Duration", &format_duration(duration));
    }
    if let Some(uploader) = &info.uploader {
        Output::kv("Uploader", uploader);
    }

    let catalog = info.catalog();
    if catalog.is_empty() {
        Output::warning("No downloadable formats found.");
        return Ok(());
    }

    for (title, formats, blocked) in catalog.sections() {
        if !formats.is_empty() {
            Output::format_section(title, formats, blocked);
        }
    }

    let Some(answer) = prompter.ask("\nEnter format ID(s) (comma-separated): ")? else {
        return Ok(());
    };
    let selected = parse_selection(&answer, &catalog)?;

    let dir = output_dir(settings)?;
    for id in &selected {
        let request = DownloadRequest::single_format(id, &dir)
            .with_merge_format(Some(settings.downloader.merge_output_format.clone()))
            .with_cookies(cookies.clone());
        match download_with_progress(ytdlp, url.as_str(), &request, &format!("Format {}", id)).await
        {
            Ok(()) => Output::success(&format!("Format {} downloaded.", id)),
            Err(e) => Output::error(&format!("Format {}: {}", id, e)),
        }
    }

    Ok(())
}

fn ask_url<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<Option<String>> {
    Ok(prompter
        .ask("Enter the URL: ")?
        .filter(|url| !url.is_empty()))
}

fn output_dir(settings: &Settings) -> Result<std::path::PathBuf> {
    let dir = settings.output_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
