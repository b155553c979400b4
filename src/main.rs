//! Medley CLI entry point.

use anyhow::Result;
use clap::Parser;
use medley::cli::{commands, Cli, Commands};
use medley::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = settings.log_level(cli.verbose);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("medley={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Download { url } => {
            commands::run_download(url.as_deref(), &settings).await?;
        }

        Commands::Grab(args) => {
            commands::run_grab(args, &settings).await?;
        }

        Commands::Short { url } => {
            commands::run_short(url, &settings).await?;
        }

        Commands::Reel { url } => {
            commands::run_reel(url, &settings).await?;
        }

        Commands::Merge {
            video,
            audio,
            output,
        } => {
            commands::run_merge(
                video.as_deref(),
                audio.as_deref(),
                output.as_deref(),
                &settings,
            )
            .await?;
        }

        Commands::Dir => {
            commands::run_dir()?;
        }

        Commands::Speech { mode } => {
            commands::run_speech(mode, &settings).await?;
        }

        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            commands::run_serve(&host, port, &settings).await?;
        }

        Commands::Chat(args) => {
            commands::run_chat(args, &settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
