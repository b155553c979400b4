//! Medley - a small command-line toolbox
//!
//! Bundles four utilities behind one binary and library.
//!
//! # Overview
//!
//! Medley allows you to:
//! - Inspect a video's formats through yt-dlp and download the ones you pick
//! - Run a chat backend over HTTP with per-session conversation history
//! - Record, recognize and speak audio, and save it as `.mp3` or `.txt`
//! - Create, rename and delete directories and files interactively
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `media` - yt-dlp wrapper, format classification, selection and merging
//! - `chat` - Conversation model, stores, language model and the chat service
//! - `server` - HTTP API over the chat service
//! - `speech` - Microphone capture, recognition and synthesis
//! - `files` - Directory and file primitives
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use medley::config::Settings;
//! use medley::media::YtDlp;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let ytdlp = YtDlp::new(&settings.downloader.ytdlp_binary);
//!
//!     let info = ytdlp.fetch_info("https://youtu.be/dQw4w9WgXcQ", None).await?;
//!     for id in info.catalog().valid_ids() {
//!         println!("{}", id);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod media;
pub mod openai;
pub mod server;
pub mod speech;

pub use error::{MedleyError, Result};
