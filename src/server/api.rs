use std::path::PathBuf;

use axum::{
    body::{to_bytes, Body},
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::events::EventBus;

pub const CLIENT_PATH: &str = "/__assembly/livereload.js";
pub const WS_PATH: &str = "/__assembly/ws";
pub const HEALTH_PATH: &str = "/__assembly/health";

const CLIENT_JS: &str = include_str!("livereload.js");

#[derive(Clone)]
pub struct AppState {
    pub events: EventBus,
}

/// Routes for the dev server; everything outside `/__assembly/` is served
/// from `root`.
pub fn router(root: PathBuf, events: EventBus) -> Router {
    Router::new()
        .route(CLIENT_PATH, get(client_script))
        .route(WS_PATH, get(ws_handler))
        .route(HEALTH_PATH, get(health))
        .fallback_service(ServeDir::new(root))
        .layer(middleware::from_fn(inject_client))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { events })
}

async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], CLIENT_JS)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "clients": state.events.subscriber_count(),
    }))
}

/// Add the live-reload client to successful HTML responses.
async fn inject_client(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/html"))
        .unwrap_or(false);
    if !is_html || response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("failed to buffer HTML response: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

/// Insert the client `<script>` before the last `</body>`, or append it.
pub fn inject_script(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", CLIENT_PATH);
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], tag, &html[at..]),
        None => format!("{}{}", html, tag),
    }
}

async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(state, socket))
}

async fn handle_ws(state: AppState, socket: WebSocket) {
    let mut rx = state.events.subscribe();
    let (mut sender, mut receiver) = socket.split();

    // Forward reload-worthy task events to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(message) = event.reload_message() else { continue };
                    let Ok(text) = serde_json::to_string(&message) else { continue };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("live-reload client lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Clients only talk to close the connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::debug!("live-reload client disconnected");
}
