//! WebSocket notification channel.
//!
//! Matches are pushed over a broadcast channel to every subscriber connected
//! at the moment the match is found. Subscribers may register at any time,
//! including while a poll cycle is mid-flight; with nobody connected the
//! broadcast is simply dropped.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use slotwatch_scraper::AppointmentMatch;

const CHANNEL_CAPACITY: usize = 64;

const HOME_PAGE: &str = include_str!("home.html");

/// Wire payloads, shaped exactly as subscribers expect them:
/// `{"name": ..., "date": ...}` for a match, `{"error": ...}` for the
/// duplicate signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Match { name: String, date: String },
    Error { error: String },
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Payload>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Broadcasts a fresh match to all currently connected subscribers.
    pub fn notify_match(&self, found: &AppointmentMatch) {
        // Send fails only when no subscriber is connected; that is fine.
        let _ = self.tx.send(Payload::Match {
            name: found.office_name.clone(),
            date: found.formatted.clone(),
        });
    }

    /// Broadcasts the duplicate-match signal.
    pub fn notify_duplicate(&self) {
        let _ = self.tx.send(Payload::Error {
            error: "found duplicate match!".to_string(),
        });
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Payload> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_app(notifier: Notifier) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/ws", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(notifier)
}

async fn home_page() -> Html<&'static str> {
    Html(HOME_PAGE)
}

async fn ws_upgrade(
    State(notifier): State<Notifier>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| forward_signals(socket, notifier.subscribe()))
}

/// Pushes broadcast payloads to one subscriber until either side hangs up.
/// Incoming client messages are drained and logged, nothing more.
async fn forward_signals(mut socket: WebSocket, mut rx: broadcast::Receiver<Payload>) {
    loop {
        tokio::select! {
            payload = rx.recv() => match payload {
                Ok(payload) => {
                    let Ok(text) = serde_json::to_string(&payload) else {
                        continue;
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscriber lagged behind the notification feed");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(message)) => tracing::debug!(?message, "received from subscriber"),
                _ => break,
            },
        }
    }
}
