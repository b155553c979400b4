//! Terminal client for the chat server.

use crate::chat::{append_transcript, ChatClient};
use crate::cli::preflight::{self, Operation};
use crate::cli::{ChatArgs, Output, Prompter};
use crate::config::Settings;
use crate::speech::{build_synthesizer, listen, MicCapture, SpeechSynthesizer, WhisperRecognizer};
use anyhow::Result;
use chrono::{DateTime, Local};
use console::style;

/// What a line typed into the client means.
#[derive(Debug, PartialEq, Eq)]
enum ClientCommand {
    Quit,
    Help,
    History,
    HistoryAll,
    Status,
    Clear,
    Skip,
    Message(String),
}

fn parse_client_input(input: &str) -> ClientCommand {
    let input = input.trim();
    match input.to_lowercase().as_str() {
        "" => ClientCommand::Skip,
        "quit" | "exit" | "bye" | "q" => ClientCommand::Quit,
        "help" => ClientCommand::Help,
        "history" => ClientCommand::History,
        "history all" => ClientCommand::HistoryAll,
        "status" => ClientCommand::Status,
        "clear" => ClientCommand::Clear,
        _ => ClientCommand::Message(input.to_string()),
    }
}

/// One exchange kept by the client.
struct Exchange {
    at: DateTime<Local>,
    user: String,
    assistant: String,
}

/// Microphone input and spoken replies, when enabled.
struct Voice {
    capture: Option<(MicCapture, WhisperRecognizer)>,
    synth: Option<Box<dyn SpeechSynthesizer>>,
}

impl Voice {
    async fn new(args: &ChatArgs, settings: &Settings) -> Self {
        let mut voice = Voice {
            capture: None,
            synth: None,
        };
        if !args.mic && !args.tts {
            return voice;
        }

        let operation = if args.offline_tts && !args.mic {
            Operation::OfflineSpeech
        } else {
            Operation::Speech
        };
        if let Err(e) = preflight::check(operation, settings) {
            Output::warning(&format!("Speech disabled: {}", e));
            return voice;
        }

        if args.mic {
            voice.capture = Some((
                MicCapture::new(&settings.speech),
                WhisperRecognizer::new(&settings.api, &settings.speech),
            ));
        }
        if args.tts {
            voice.synth =
                Some(build_synthesizer(&settings.api, &settings.speech, args.offline_tts).await);
        }
        voice
    }
}

/// Run the chat client.
pub async fn run_chat(args: &ChatArgs, settings: &Settings) -> Result<()> {
    let base_url = args
        .url
        .clone()
        .unwrap_or_else(|| settings.server.base_url());
    let client = ChatClient::new(&base_url, args.session.clone())?;
    let voice = Voice::new(args, settings).await;
    let mut prompter = Prompter::stdio();
    let mut exchanges: Vec<Exchange> = Vec::new();

    println!("\n{}", style("Medley Chat").bold().cyan());
    Output::kv("Backend", client.base_url());
    Output::kv("Session", client.session_id());
    Output::kv("Microphone", enabled(voice.capture.is_some()));
    Output::kv("Text-to-speech", enabled(voice.synth.is_some()));
    if let Some(path) = &args.save {
        Output::kv("Saving to", &path.display().to_string());
    }
    println!(
        "{}\n",
        style("Type 'help' for commands, 'quit' to leave.").dim()
    );

    loop {
        let line = match &voice.capture {
            Some((capture, recognizer)) => {
                Output::info("Listening... (speak your message)");
                match listen(capture, recognizer).await {
                    Ok(recognition) => {
                        println!("{} {}", style("Recognized:").dim(), recognition.text);
                        recognition.text
                    }
                    Err(e) => {
                        Output::warning(&format!("Speech recognition failed: {}", e));
                        continue;
                    }
                }
            }
            None => match prompter.ask(&format!("{} ", style("You:").green().bold()))? {
                Some(line) => line,
                None => {
                    Output::info("End of input");
                    break;
                }
            },
        };

        match parse_client_input(&line) {
            ClientCommand::Skip => continue,
            ClientCommand::Quit => {
                Output::info("Goodbye!");
                break;
            }
            ClientCommand::Help => show_help(),
            ClientCommand::History => show_local_history(&exchanges),
            ClientCommand::HistoryAll => match client.history().await {
                Ok(conversation) => {
                    Output::header(&format!(
                        "Server history ({} messages)",
                        conversation.messages.len()
                    ));
                    for message in &conversation.messages {
                        println!(
                            "  [{}] {}: {}",
                            message.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                            message.role,
                            message.content
                        );
                    }
                }
                Err(e) => Output::error(&format!("Error retrieving history: {}", e)),
            },
            ClientCommand::Status => show_status(&client, &voice, exchanges.len()).await,
            ClientCommand::Clear => {
                exchanges.clear();
                Output::info("Conversation history cleared");
            }
            ClientCommand::Message(text) => {
                let spinner = Output::spinner("Sending message...");
                let reply = client.send_message(&text).await;
                spinner.finish_and_clear();

                let reply = match reply {
                    Ok(reply) => reply,
                    Err(e) => {
                        Output::error(&format!("Failed to get response: {}", e));
                        continue;
                    }
                };
                println!("{} {}", style("AI:").cyan().bold(), reply.response);

                if let Some(synth) = &voice.synth {
                    if let Err(e) = synth.speak(&reply.response).await {
                        Output::warning(&format!("Failed to speak response: {}", e));
                    }
                }
                if let Some(path) = &args.save {
                    if let Err(e) = append_transcript(path, &text, &reply.response) {
                        Output::warning(&format!("Could not save conversation: {}", e));
                    }
                }

                exchanges.push(Exchange {
                    at: Local::now(),
                    user: text,
                    assistant: reply.response,
                });
            }
        }
    }

    Output::header("Conversation summary");
    Output::kv("Messages exchanged", &exchanges.len().to_string());
    Output::kv("Session", client.session_id());
    if let Some(path) = &args.save {
        Output::kv("Saved to", &path.display().to_string());
    }
    Ok(())
}

fn enabled(on: bool) -> &'static str {
    if on {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn show_help() {
    Output::header("Available commands");
    Output::kv("help", "Show this help message");
    Output::kv("history", "Show this session's local history");
    Output::kv("history all", "Show the history stored on the server");
    Output::kv("status", "Show connection status");
    Output::kv("clear", "Clear local conversation history");
    Output::kv("quit/exit/bye/q", "End the conversation");
}

fn show_local_history(exchanges: &[Exchange]) {
    if exchanges.is_empty() {
        Output::info("No local conversation history");
        return;
    }
    Output::header(&format!("Local history ({} messages)", exchanges.len()));
    for (i, exchange) in exchanges.iter().enumerate() {
        let at = exchange.at.format("%H:%M:%S");
        println!("  {}. [{}] You: {}", i + 1, at, exchange.user);
        println!("     [{}] AI:  {}", at, exchange.assistant);
    }
}

async fn show_status(client: &ChatClient, voice: &Voice, local: usize) {
    Output::header("Status");
    Output::kv("Backend URL", client.base_url());
    Output::kv("Session", client.session_id());
    Output::kv("Microphone", enabled(voice.capture.is_some()));
    Output::kv("Text-to-speech", enabled(voice.synth.is_some()));
    Output::kv("Local messages", &local.to_string());

    match client.health().await {
        Ok(health) => {
            Output::kv("Backend status", &health.status);
            Output::kv("Store", &health.store);
            Output::kv("Model", &health.model);
        }
        Err(e) => Output::kv("Backend status", &format!("Connection failed ({})", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_input() {
        assert_eq!(parse_client_input("  "), ClientCommand::Skip);
        assert_eq!(parse_client_input("BYE"), ClientCommand::Quit);
        assert_eq!(parse_client_input("q"), ClientCommand::Quit);
        assert_eq!(parse_client_input("History"), ClientCommand::History);
        assert_eq!(parse_client_input("history all"), ClientCommand::HistoryAll);
        assert_eq!(parse_client_input("status"), ClientCommand::Status);
        assert_eq!(parse_client_input("clear"), ClientCommand::Clear);
        assert_eq!(
            parse_client_input(" What is Rust? "),
            ClientCommand::Message("What is Rust?".to_string())
        );
    }
}
