//! HTTP API for the chat service.

use crate::chat::{ChatRequest, ChatService};
use crate::error::MedleyError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    service: ChatService,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the router with open CORS.
pub fn router(service: ChatService) -> Router {
    let state = Arc::new(AppState { service });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat))
        .route("/history/{session_id}", get(history).delete(clear_history))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, service: ChatService) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Chat server listening on {}", addr);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

fn error_response(err: MedleyError) -> Response {
    let (status, message) = match err {
        MedleyError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        MedleyError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        MedleyError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        e @ MedleyError::Model(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        other => {
            error!("Request failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error: {}", other),
            )
        }
    };

    (status, Json(ErrorResponse { error: message })).into_response()
}

async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(MedleyError::InvalidInput(format!(
                "Missing session_id or message ({})",
                rejection.body_text()
            )))
        }
    };

    match state.service.send(request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(e),
    }
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.service.history(&session_id).await {
        Ok(conversation) => Json(conversation).into_response(),
        Err(e) => error_response(e),
    }
}

async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.service.clear(&session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.health().await)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Endpoint not found".to_string(),
        }),
    )
}
