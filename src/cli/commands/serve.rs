//! HTTP chat server command.

use crate::chat::{open_store, ChatService, OpenAiChatModel};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::server;
use std::sync::Arc;

/// Run the chat HTTP server.
pub async fn run_serve(host: &str, port: u16, settings: &Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, settings) {
        Output::warning(&format!("{} (chat requests will fail until it is set)", e));
    }

    let store = open_store(settings)?;
    let model = Arc::new(OpenAiChatModel::new(&settings.api, &settings.chat));
    let service = ChatService::new(store, model, settings.chat.history_window);

    let addr = format!("{}:{}", host, port);

    Output::header("Medley Chat Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Store", &settings.store.provider.to_string());
    Output::kv("Model", &settings.chat.model);
    println!();
    println!("Endpoints:");
    Output::kv("Chat", "POST   /chat");
    Output::kv("History", "GET    /history/{session_id}");
    Output::kv("Clear", "DELETE /history/{session_id}");
    Output::kv("Health", "GET    /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(&addr, service).await?;

    Ok(())
}
