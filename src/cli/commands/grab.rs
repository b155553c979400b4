//! Quality/type driven download.
//!
//! Metadata fetch and download run on background tasks. They report back over
//! a single channel and only the foreground task touches the terminal.

use super::cookies_for;
use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::{GrabArgs, Output, Prompter};
use crate::config::Settings;
use crate::media::{
    format_selector, output_template, quality_options, sanitize_filename, validate_url,
    DownloadEvent, DownloadKind, DownloadRequest, Quality, VideoInfo, YtDlp,
};
use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Messages from the background workers.
#[derive(Debug)]
enum WorkerMessage {
    Info(Box<VideoInfo>),
    Event(DownloadEvent),
    Finished,
    Failed(String),
}

/// Run the grab command.
pub async fn run_grab(args: &GrabArgs, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Download, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'medley doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let url = validate_url(&args.url)?.to_string();
    let ytdlp = YtDlp::new(&settings.downloader.ytdlp_binary);
    let cookies = cookies_for(settings, &url);
    let mut prompter = Prompter::stdio();

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_fetch(ytdlp.clone(), url.clone(), cookies.clone(), tx.clone());

    let spinner = Output::spinner("Fetching video information...");
    let info = match rx.recv().await {
        Some(WorkerMessage::Info(info)) => info,
        Some(WorkerMessage::Failed(e)) => {
            spinner.finish_and_clear();
            return Err(anyhow!(e));
        }
        _ => {
            spinner.finish_and_clear();
            return Err(anyhow!("Metadata worker stopped unexpectedly"));
        }
    };
    spinner.finish_and_clear();

    Output::header(info.display_title());
    if let Some(duration) = info.duration {
        Output::kv("Duration", &format_duration(duration));
    }

    let options = quality_options(&info.formats);
    let quality = pick_quality(&mut prompter, args, &options)?;

    let suggested = sanitize_filename(info.display_title());
    let filename = match &args.filename {
        Some(name) => name.clone(),
        None if args.yes => suggested,
        None => prompter
            .ask_or(&format!("File name [{}]: ", suggested), &suggested)?
            .unwrap_or(suggested),
    };

    let dir = args.output.clone().unwrap_or_else(|| settings.output_dir());
    std::fs::create_dir_all(&dir)?;

    let merge = match args.kind {
        DownloadKind::Audio => None,
        _ => Some(settings.downloader.merge_output_format.clone()),
    };
    let request = DownloadRequest::new(
        format_selector(args.kind, quality),
        output_template(&dir, Some(&filename)),
    )
    .with_merge_format(merge)
    .with_cookies(cookies);

    Output::kv("Type", &args.kind.to_string());
    Output::kv("Quality", &quality.to_string());
    Output::kv("Saving to", &dir.display().to_string());

    spawn_download(ytdlp, url, request, tx);
    track_download(&mut rx).await?;

    Output::success("Download completed successfully!");
    Ok(())
}

fn spawn_fetch(
    ytdlp: YtDlp,
    url: String,
    cookies: Option<std::path::PathBuf>,
    tx: UnboundedSender<WorkerMessage>,
) {
    tokio::spawn(async move {
        let message = match ytdlp.fetch_info(&url, cookies.as_deref()).await {
            Ok(info) => WorkerMessage::Info(Box::new(info)),
            Err(e) => WorkerMessage::Failed(e.to_string()),
        };
        let _ = tx.send(message);
    });
}

fn spawn_download(
    ytdlp: YtDlp,
    url: String,
    request: DownloadRequest,
    tx: UnboundedSender<WorkerMessage>,
) {
    tokio::spawn(async move {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let forward_tx = tx.clone();
        let forward = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let _ = forward_tx.send(WorkerMessage::Event(event));
            }
        });

        let result = ytdlp.download(&url, &request, Some(event_tx)).await;
        let _ = forward.await;

        let _ = tx.send(match result {
            Ok(()) => WorkerMessage::Finished,
            Err(e) => WorkerMessage::Failed(e.to_string()),
        });
    });
}

async fn track_download(rx: &mut UnboundedReceiver<WorkerMessage>) -> Result<()> {
    let pb = Output::progress_bar(100, "Downloading");

    while let Some(message) = rx.recv().await {
        match message {
            WorkerMessage::Event(DownloadEvent::Progress(percent)) => {
                pb.set_position(percent.clamp(0.0, 100.0) as u64);
            }
            WorkerMessage::Event(DownloadEvent::Destination(path)) => {
                pb.set_position(0);
                pb.set_message(path);
            }
            WorkerMessage::Event(DownloadEvent::Message(line)) => debug!("{}", line),
            WorkerMessage::Finished => {
                pb.finish_with_message("Done");
                return Ok(());
            }
            WorkerMessage::Failed(e) => {
                pb.abandon_with_message("Failed");
                return Err(anyhow!(e));
            }
            WorkerMessage::Info(_) => {}
        }
    }

    pb.abandon();
    Err(anyhow!("Download worker stopped unexpectedly"))
}

fn pick_quality<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    args: &GrabArgs,
    options: &[Quality],
) -> Result<Quality> {
    if args.kind == DownloadKind::Audio {
        return Ok(Quality::AudioBest);
    }
    if let Some(given) = &args.quality {
        return choose_quality(options, given).map_err(|e| anyhow!(e));
    }
    if args.yes {
        return Ok(Quality::Best);
    }

    println!("\nAvailable qualities:");
    for (i, option) in options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
    loop {
        let Some(answer) = prompter.ask_or("Choose quality [1]: ", "1")? else {
            return Ok(Quality::Best);
        };
        match choose_quality(options, &answer) {
            Ok(quality) => return Ok(quality),
            Err(e) => Output::warning(&e),
        }
    }
}

/// Resolve a 1-based menu number or a quality name against the offered options.
fn choose_quality(options: &[Quality], answer: &str) -> std::result::Result<Quality, String> {
    if let Ok(index) = answer.trim().parse::<usize>() {
        if (1..=options.len()).contains(&index) {
            return Ok(options[index - 1]);
        }
    }
    let quality: Quality = answer.parse()?;
    if options.contains(&quality) {
        Ok(quality)
    } else {
        Err(format!("Quality {} is not available for this video", quality))
    }
}
