//! CLI module for Medley.

pub mod commands;
mod output;
pub mod preflight;
mod prompt;

pub use output::Output;
pub use prompt::Prompter;

use crate::media::DownloadKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Medley - a small toolbox for media, chat and speech
///
/// Downloads media through yt-dlp, runs a chat backend with a terminal client,
/// manages directories, and records, recognizes and speaks audio.
#[derive(Parser, Debug)]
#[command(name = "medley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a video's formats and download the ones you pick (menu when no URL is given)
    Download {
        /// Video URL
        url: Option<String>,
    },

    /// Download by quality and type with a live progress bar
    Grab(GrabArgs),

    /// Download a YouTube Short in the best quality
    Short {
        /// Short URL
        url: String,
    },

    /// Download an Instagram reel
    Reel {
        /// Reel URL
        url: String,
    },

    /// Merge a video file and an audio file into one MP4
    Merge {
        /// Video file (.mp4 is added when missing)
        video: Option<String>,
        /// Audio file (.mp3 is added when missing)
        audio: Option<String>,
        /// Output file (.mp4 is added when missing)
        output: Option<String>,
    },

    /// Create, rename and delete directories and files interactively
    Dir,

    /// Speech recognition and text-to-speech tools
    Speech {
        #[command(subcommand)]
        mode: SpeechMode,
    },

    /// Start the chat HTTP server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with a running server from the terminal
    Chat(ChatArgs),

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GrabArgs {
    /// Video URL
    pub url: String,

    /// What to download: both, video or audio
    #[arg(short = 't', long = "type", default_value = "both")]
    pub kind: DownloadKind,

    /// Quality such as "best", "720p" or "audio" (prompted when omitted)
    #[arg(short, long)]
    pub quality: Option<String>,

    /// File name without extension (defaults to the cleaned-up title)
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Output directory (defaults to downloader.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Accept defaults instead of prompting
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Server URL (defaults to the configured server address)
    #[arg(long)]
    pub url: Option<String>,

    /// Session id (generated when omitted)
    #[arg(long)]
    pub session: Option<String>,

    /// Speak your messages instead of typing them
    #[arg(long)]
    pub mic: bool,

    /// Read replies aloud
    #[arg(long)]
    pub tts: bool,

    /// Use the offline speech engine for replies
    #[arg(long)]
    pub offline_tts: bool,

    /// Append the conversation to this file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SpeechMode {
    /// Record speech and print the recognized text
    Stt {
        /// Save the text (.txt) or re-spoken audio (.mp3)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Speak the contents of a text file
    Tts {
        /// Text file to read
        file: PathBuf,

        /// Write an MP3 instead of playing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the offline engine
        #[arg(long)]
        offline: bool,
    },

    /// Record speech and save it back as synthesized audio
    Sts {
        /// Output file (.mp3 or .txt)
        #[arg(short, long, default_value = "output.mp3")]
        output: PathBuf,

        /// Use the offline engine
        #[arg(long)]
        offline: bool,
    },

    /// Check the microphone, recognition and playback
    Test {
        /// Use the offline engine
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "chat.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
