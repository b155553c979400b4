//! Speech command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, Prompter, SpeechMode};
use crate::config::Settings;
use crate::error::MedleyError;
use crate::speech::{
    build_synthesizer, listen, read_script, save_script, MicCapture, Recognition, SaveTarget,
    SpeechSynthesizer, WhisperRecognizer,
};
use anyhow::Result;
use console::style;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::Path;

/// Answer to "Run again?".
#[derive(Debug, PartialEq, Eq)]
enum Again {
    Yes,
    No,
    Invalid,
}

fn parse_again(answer: Option<&str>) -> Again {
    match answer.map(|a| a.trim().to_lowercase()).as_deref() {
        Some("y") => Again::Yes,
        Some("n") => Again::No,
        _ => Again::Invalid,
    }
}

/// Run a speech mode.
pub async fn run_speech(mode: &SpeechMode, settings: &Settings) -> Result<()> {
    let offline = match mode {
        SpeechMode::Tts { offline, .. }
        | SpeechMode::Sts { offline, .. }
        | SpeechMode::Test { offline } => *offline,
        SpeechMode::Stt { .. } => false,
    };
    let operation = match mode {
        SpeechMode::Tts { offline: true, .. } => Operation::OfflineSpeech,
        _ => Operation::Speech,
    };
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'medley doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let synth = build_synthesizer(&settings.api, &settings.speech, offline).await;
    if offline && synth.name() != "offline" {
        Output::warning("Offline engine unavailable, using online speech instead.");
    }

    match mode {
        SpeechMode::Stt { output } => {
            let recognition = capture_once(settings).await?;
            if let Some(path) = output {
                save(&recognition.text, path, synth.as_ref()).await?;
            }
        }
        SpeechMode::Tts { file, output, .. } => {
            let text = read_script(file)?;
            match output {
                Some(path) => save(&text, path, synth.as_ref()).await?,
                None => {
                    let spinner = Output::spinner("Speaking...");
                    let result = synth.speak(&text).await;
                    spinner.finish_and_clear();
                    result?;
                }
            }
        }
        SpeechMode::Sts { output, .. } => {
            let target = SaveTarget::from_path(output)?;
            let mut prompter = Prompter::stdio();
            voice_notes(&mut prompter, &target, synth.as_ref(), || capture_once(settings)).await?;
        }
        SpeechMode::Test { .. } => run_self_test(settings, synth.as_ref()).await?,
    }

    Ok(())
}

/// Capture, recognize and save until the user declines another round.
///
/// Capture and save failures are reported and the loop still asks to run again.
/// Returns the number of notes saved.
async fn voice_notes<R, W, F, Fut>(
    prompter: &mut Prompter<R, W>,
    target: &SaveTarget,
    synth: &dyn SpeechSynthesizer,
    mut capture: F,
) -> std::io::Result<usize>
where
    R: BufRead,
    W: Write,
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::Result<Recognition>>,
{
    let mut saved = 0;
    loop {
        match capture().await {
            Ok(recognition) => match save_script(&recognition.text, target, synth).await {
                Ok(path) => {
                    Output::success(&format!("Saved to {}", path.display()));
                    saved += 1;
                }
                Err(e) => Output::error(&format!("Could not save the note: {}", e)),
            },
            Err(e) => Output::error(&capture_error_message(&e)),
        }

        match parse_again(prompter.ask("\nRun again? (Y/N): ")?.as_deref()) {
            Again::Yes => continue,
            Again::No => {
                Output::info("Exiting...");
                break;
            }
            Again::Invalid => {
                Output::warning("Invalid input, exiting...");
                break;
            }
        }
    }
    Ok(saved)
}

async fn capture_once(settings: &Settings) -> crate::Result<Recognition> {
    let capture = MicCapture::new(&settings.speech);
    let recognizer = WhisperRecognizer::new(&settings.api, &settings.speech);

    Output::info(&format!("Speak now... ({} seconds)", capture.seconds()));
    let recognition = listen(&capture, &recognizer).await?;

    println!("{} {}", style("You said:").green().bold(), recognition.text);
    if let Some(language) = &recognition.language {
        Output::kv("Language detected", language);
    }
    Ok(recognition)
}

fn capture_error_message(e: &MedleyError) -> String {
    match e {
        MedleyError::UnrecognizedSpeech => "Could not understand the audio".to_string(),
        MedleyError::Speech(msg) => format!("API request error: {}", msg),
        MedleyError::ToolNotFound(_) | MedleyError::ToolFailed(_) => {
            format!("Microphone error: {}", e)
        }
        other => format!("Unexpected error: {}", other),
    }
}

async fn save(text: &str, path: &Path, synth: &dyn SpeechSynthesizer) -> Result<()> {
    let target = SaveTarget::from_path(path)?;
    let saved = save_script(text, &target, synth).await?;
    Output::success(&format!("Saved to {}", saved.display()));
    Ok(())
}

async fn run_self_test(settings: &Settings, synth: &dyn SpeechSynthesizer) -> Result<()> {
    Output::header("Speech self-test");

    let capture = MicCapture::new(&settings.speech);
    let spinner = Output::spinner("Opening microphone...");
    let mic = capture.test().await;
    spinner.finish_and_clear();
    match &mic {
        Ok(()) => Output::success("Microphone works"),
        Err(e) => Output::error(&format!("Microphone: {}", e)),
    }

    match capture_once(settings).await {
        Ok(_) => Output::success("Recognition works"),
        Err(e) => Output::error(&capture_error_message(&e)),
    }

    match synth.speak("Speech test complete.").await {
        Ok(()) => Output::success(&format!("Playback works ({})", synth.name())),
        Err(e) => Output::error(&format!("Playback: {}", e)),
    }

    mic.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parse_again() {
        assert_eq!(parse_again(Some(" Y ")), Again::Yes);
        assert_eq!(parse_again(Some("n")), Again::No);
        assert_eq!(parse_again(Some("maybe")), Again::Invalid);
        assert_eq!(parse_again(None), Again::Invalid);
    }

    struct BrokenSynth;

    #[async_trait]
    impl SpeechSynthesizer for BrokenSynth {
        fn name(&self) -> &str {
            "broken"
        }

        async fn synthesize_to_file(&self, _text: &str, _dest: &Path) -> crate::Result<()> {
            Err(MedleyError::Speech("Speech synthesis failed: 401".to_string()))
        }

        async fn speak(&self, _text: &str) -> crate::Result<()> {
            Ok(())
        }
    }

    fn heard(text: &str) -> crate::Result<Recognition> {
        Recognition::from_parts(text, Some("english"))
    }

    #[tokio::test]
    async fn test_voice_notes_continue_after_save_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = SaveTarget::from_path(&dir.path().join("note.mp3")).unwrap();
        let mut prompter = Prompter::new(Cursor::new("y\nn\n"), Vec::new());
        let rounds = AtomicUsize::new(0);

        let saved = voice_notes(&mut prompter, &target, &BrokenSynth, || {
            rounds.fetch_add(1, Ordering::SeqCst);
            async { heard("hello") }
        })
        .await
        .unwrap();

        assert_eq!(rounds.load(Ordering::SeqCst), 2);
        assert_eq!(saved, 0);
        let output = String::from_utf8(prompter.into_output()).unwrap();
        assert_eq!(output.matches("Run again?").count(), 2);
    }

    #[tokio::test]
    async fn test_voice_notes_save_text_and_survive_capture_errors() {
        let dir = tempfile::tempdir().unwrap();
        let target = SaveTarget::from_path(&dir.path().join("note.txt")).unwrap();
        let mut prompter = Prompter::new(Cursor::new("Y\nY\nmaybe\n"), Vec::new());
        let rounds = AtomicUsize::new(0);

        let saved = voice_notes(&mut prompter, &target, &BrokenSynth, || {
            let round = rounds.fetch_add(1, Ordering::SeqCst);
            async move {
                match round {
                    1 => Err(MedleyError::UnrecognizedSpeech),
                    _ => heard(&format!("note {}", round)),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(rounds.load(Ordering::SeqCst), 3);
        assert_eq!(saved, 2);
        assert_eq!(std::fs::read_to_string(target.path()).unwrap(), "note 2");
    }

    #[test]
    fn test_capture_error_messages() {
        assert_eq!(
            capture_error_message(&MedleyError::UnrecognizedSpeech),
            "Could not understand the audio"
        );
        assert_eq!(
            capture_error_message(&MedleyError::Speech("timeout".to_string())),
            "API request error: timeout"
        );
        assert!(capture_error_message(&MedleyError::ToolNotFound("ffmpeg".to_string()))
            .starts_with("Microphone error"));
        assert!(capture_error_message(&MedleyError::Store("x".to_string()))
            .starts_with("Unexpected error"));
    }
}
