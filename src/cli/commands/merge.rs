//! Merge command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, Prompter};
use crate::config::Settings;
use crate::media::{merge_video_audio, MergeRequest};
use anyhow::Result;
use std::io::{BufRead, Write};

/// Run the merge command, prompting for any name not given.
pub async fn run_merge(
    video: Option<&str>,
    audio: Option<&str>,
    output: Option<&str>,
    settings: &Settings,
) -> Result<()> {
    preflight::check(Operation::Merge, settings)?;
    let mut prompter = Prompter::stdio();
    merge_interactive(&mut prompter, video, audio, output).await
}

pub(super) async fn merge_interactive<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    video: Option<&str>,
    audio: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let Some(video) = name_or_ask(prompter, video, "Enter the video file name: ")? else {
        return Ok(());
    };
    let Some(audio) = name_or_ask(prompter, audio, "Enter the audio file name: ")? else {
        return Ok(());
    };
    let Some(output) = name_or_ask(prompter, output, "Enter the output file name: ")? else {
        return Ok(());
    };

    let request = MergeRequest::new(&video, &audio, &output);
    let spinner = Output::spinner("Merging...");
    let result = merge_video_audio(&request).await;
    spinner.finish_and_clear();

    let merged = result?;
    Output::success(&format!("Merged into {}", merged.display()));
    Ok(())
}

fn name_or_ask<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    given: Option<&str>,
    question: &str,
) -> Result<Option<String>> {
    if let Some(name) = given.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(Some(name.to_string()));
    }
    loop {
        match prompter.ask(question)? {
            None => return Ok(None),
            Some(answer) if answer.is_empty() => Output::warning("A file name is required."),
            Some(answer) => return Ok(Some(answer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_name_or_ask_prefers_given_name() {
        let mut p = Prompter::new(Cursor::new(""), Vec::new());
        assert_eq!(
            name_or_ask(&mut p, Some(" clip "), "? ").unwrap().as_deref(),
            Some("clip")
        );
    }

    #[test]
    fn test_name_or_ask_repeats_until_answered() {
        let mut p = Prompter::new(Cursor::new("\n\nsong\n"), Vec::new());
        assert_eq!(
            name_or_ask(&mut p, None, "Audio: ").unwrap().as_deref(),
            Some("song")
        );
        let mut p = Prompter::new(Cursor::new(""), Vec::new());
        assert_eq!(name_or_ask(&mut p, None, "Audio: ").unwrap(), None);
    }

    #[tokio::test]
    async fn test_merge_reports_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("absent");
        let audio = dir.path().join("song");
        let out = dir.path().join("out");
        let mut p = Prompter::new(Cursor::new(""), Vec::new());

        let err = merge_interactive(
            &mut p,
            video.to_str(),
            audio.to_str(),
            out.to_str(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Video file"));
    }
}
