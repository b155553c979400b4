//! Text-to-speech engines.

use crate::config::{ApiSettings, SpeechSettings};
use crate::error::{spawn_error, MedleyError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_openai::Client;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Trait for text-to-speech engines.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Engine name for status output.
    fn name(&self) -> &str;

    /// Write spoken `text` to `dest` as MP3.
    async fn synthesize_to_file(&self, text: &str, dest: &Path) -> Result<()>;

    /// Play `text` through the speakers.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// OpenAI speech endpoint.
pub struct OpenAiSynthesizer {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

fn parse_voice(name: &str) -> Voice {
    match name.trim().to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        other => {
            warn!("Unknown voice '{}', using alloy", other);
            Voice::Alloy
        }
    }
}

fn parse_speech_model(name: &str) -> SpeechModel {
    match name.trim() {
        "tts-1-hd" => SpeechModel::Tts1Hd,
        _ => SpeechModel::Tts1,
    }
}

impl OpenAiSynthesizer {
    pub fn new(api: &ApiSettings, speech: &SpeechSettings) -> Self {
        Self {
            client: create_client(api),
            model: parse_speech_model(&speech.tts_model),
            voice: parse_voice(&speech.voice),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    fn name(&self) -> &str {
        "online"
    }

    #[instrument(skip(self, text), fields(dest = %dest.display()))]
    async fn synthesize_to_file(&self, text: &str, dest: &Path) -> Result<()> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.model.clone())
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| MedleyError::Speech(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(|e| MedleyError::Speech(format!("Speech synthesis failed: {}", e)))?;

        tokio::fs::write(dest, &response.bytes).await?;
        info!("Wrote {} bytes of speech", response.bytes.len());
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let dir = tempfile::tempdir()?;
        let clip = dir.path().join("speech.mp3");
        self.synthesize_to_file(text, &clip).await?;
        play(&clip).await
    }
}

/// Play an audio file with ffplay and wait for it to finish.
async fn play(path: &Path) -> Result<()> {
    let status = Command::new("ffplay")
        .args(["-nodisp", "-autoexit", "-loglevel", "error"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .await
        .map_err(|e| spawn_error("ffplay", e))?;

    if !status.success() {
        return Err(MedleyError::ToolFailed(format!("ffplay exited with {}", status)));
    }
    Ok(())
}

/// Local espeak-ng engine.
pub struct EspeakSynthesizer {
    binary: String,
    rate: u32,
    volume: f32,
}

impl EspeakSynthesizer {
    pub fn new(speech: &SpeechSettings) -> Self {
        Self {
            binary: speech.offline_engine.clone(),
            rate: speech.offline_rate,
            volume: speech.offline_volume,
        }
    }

    /// Whether the engine can be launched.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// espeak amplitude runs 0-200 with 100 as normal volume.
    fn amplitude(&self) -> u32 {
        (self.volume.clamp(0.0, 2.0) * 100.0).round() as u32
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            self.amplitude().to_string(),
        ]
    }

    async fn run(&self, extra: &[&OsStr], text: &str) -> Result<()> {
        let result = Command::new(&self.binary)
            .args(self.args())
            .args(extra)
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error(&self.binary, e))?;

        if !result.status.success() {
            let err = String::from_utf8_lossy(&result.stderr);
            return Err(MedleyError::Speech(format!(
                "{} failed: {}",
                self.binary,
                err.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    fn name(&self) -> &str {
        "offline"
    }

    #[instrument(skip(self, text), fields(dest = %dest.display()))]
    async fn synthesize_to_file(&self, text: &str, dest: &Path) -> Result<()> {
        let dir = tempfile::tempdir()?;
        let wav = dir.path().join("speech.wav");
        self.run(&[OsStr::new("-w"), wav.as_os_str()], text).await?;

        debug!("Encoding {:?} to MP3", wav);
        let result = Command::new("ffmpeg")
            .arg("-i")
            .arg(&wav)
            .args(["-codec:a", "libmp3lame", "-qscale:a", "2", "-y", "-loglevel", "error"])
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error("ffmpeg", e))?;

        if !result.status.success() {
            let err = String::from_utf8_lossy(&result.stderr);
            return Err(MedleyError::Speech(format!(
                "ffmpeg conversion failed: {}",
                err.trim()
            )));
        }
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<()> {
        self.run(&[], text).await
    }
}

/// Pick the requested engine, falling back to online when offline is unavailable.
pub async fn build_synthesizer(
    api: &ApiSettings,
    speech: &SpeechSettings,
    offline: bool,
) -> Box<dyn SpeechSynthesizer> {
    if offline {
        let espeak = EspeakSynthesizer::new(speech);
        if espeak.is_available().await {
            return Box::new(espeak);
        }
        warn!(
            "Offline engine {} not available, falling back to online speech",
            speech.offline_engine
        );
    }
    Box::new(OpenAiSynthesizer::new(api, speech))
}
