//! Speech tools: microphone capture, recognition, synthesis and saving.

mod capture;
mod recognizer;
mod saver;
mod synth;

pub use capture::{default_input, MicCapture};
pub use recognizer::{Recognition, Recognizer, WhisperRecognizer};
pub use saver::{read_script, save_script, SaveTarget};
pub use synth::{build_synthesizer, EspeakSynthesizer, OpenAiSynthesizer, SpeechSynthesizer};

use crate::error::Result;
use tracing::instrument;

/// Record one utterance and recognize it.
#[instrument(skip_all)]
pub async fn listen(capture: &MicCapture, recognizer: &dyn Recognizer) -> Result<Recognition> {
    let dir = tempfile::tempdir()?;
    let clip = capture.record(&dir.path().join("utterance.wav")).await?;
    recognizer.recognize(&clip).await
}
