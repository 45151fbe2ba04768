//! Socket.IO event stream with auto-reconnect.
//!
//! The backend announces every routing change on a Socket.IO channel
//! (`output_create`, `mixer_update`, ...). This module speaks just enough
//! Engine.IO v4 over a plain WebSocket to receive those events and streams
//! them through a [`tokio::sync::broadcast`] channel. Reconnection uses
//! exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use patchbay_api::socket::{socket_url, EventSocket, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = socket_url(&"http://studio.local:5000".parse()?)?;
//! let socket = EventSocket::connect(url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = socket.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{}: {}", event.name, event.payload);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── BackendEvent ─────────────────────────────────────────────────────

/// A named event emitted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendEvent {
    /// Event name, e.g. `"output_create"`, `"mixer_channel_update"`.
    pub name: String,

    /// Event argument. Multiple arguments are folded into an array,
    /// none becomes `null`.
    pub payload: serde_json::Value,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for socket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── URL helper ───────────────────────────────────────────────────────

/// Derive the Socket.IO WebSocket endpoint from the REST base URL.
///
/// `http://host:5000/` → `ws://host:5000/socket.io/?EIO=4&transport=websocket`
pub fn socket_url(base_url: &Url) -> Result<Url, Error> {
    let mut url = base_url.join("socket.io/")?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::SocketConnect(format!("cannot use {base_url} as a socket URL")))?;
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

// ── EventSocket ──────────────────────────────────────────────────────

/// Handle to a running event stream.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`connect`](Self::connect)) to tear down the background task.
pub struct EventSocket {
    event_rx: broadcast::Receiver<Arc<BackendEvent>>,
    cancel: CancellationToken,
}

impl EventSocket {
    /// Spawn the connect/reconnect loop and return immediately.
    ///
    /// The first connection attempt happens asynchronously -- subscribe to
    /// start consuming events.
    pub fn connect(url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            socket_loop(url, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BackendEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

async fn socket_loop(
    url: Url,
    event_tx: broadcast::Sender<Arc<BackendEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, &event_tx, &cancel) => result,
        };

        match result {
            Ok(()) if cancel.is_cancelled() => break,
            Ok(()) => {
                tracing::info!("event socket disconnected cleanly, reconnecting");
                attempt = 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "event socket error");

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(max_retries = max, "event socket retry limit reached, giving up");
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, &reconnect);
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                tracing::info!(delay_ms, attempt, "waiting before reconnect");

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt = attempt.saturating_add(1);
            }
        }
    }

    tracing::debug!("event socket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection and read packets until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<BackendEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to event socket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::SocketConnect(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();

    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => frame,
        };

        match frame {
            Some(Ok(tungstenite::Message::Text(text))) => {
                let reply = match parse_packet(&text) {
                    Some(Packet::Open) => Some("40"),
                    Some(Packet::Ping) => Some("3"),
                    Some(Packet::Connected) => {
                        tracing::info!("event socket joined namespace");
                        None
                    }
                    Some(Packet::ConnectError(reason)) => {
                        return Err(Error::SocketConnect(reason));
                    }
                    Some(Packet::Close) => return Ok(()),
                    Some(Packet::Event(event)) => {
                        // No subscribers right now is fine.
                        let _ = event_tx.send(Arc::new(event));
                        None
                    }
                    Some(Packet::Ignored) => None,
                    None => {
                        tracing::debug!(frame = %text.as_str(), "unparseable socket frame");
                        None
                    }
                };

                if let Some(reply) = reply {
                    write
                        .send(tungstenite::Message::text(reply.to_owned()))
                        .await
                        .map_err(|e| Error::SocketConnect(e.to_string()))?;
                }
            }
            Some(Ok(tungstenite::Message::Close(frame))) => {
                return match frame {
                    Some(cf) if cf.code != tungstenite::protocol::frame::coding::CloseCode::Normal => {
                        Err(Error::SocketClosed {
                            code: cf.code.into(),
                            reason: cf.reason.as_str().to_owned(),
                        })
                    }
                    _ => Ok(()),
                };
            }
            Some(Err(e)) => return Err(Error::SocketConnect(e.to_string())),
            None => {
                tracing::info!("event socket stream ended");
                return Ok(());
            }
            Some(Ok(_)) => {
                // Binary, Ping, Pong, Frame -- tungstenite answers pings itself
            }
        }
    }
}

// ── Packet parsing ───────────────────────────────────────────────────

/// The subset of Engine.IO / Socket.IO packets the client reacts to.
#[derive(Debug, PartialEq)]
enum Packet {
    /// Engine.IO handshake (`0{...}`); answer by joining the namespace.
    Open,
    /// Engine.IO close (`1`).
    Close,
    /// Engine.IO ping (`2`); answer with a pong.
    Ping,
    /// Namespace joined (`40...`).
    Connected,
    /// Namespace join refused (`44...`).
    ConnectError(String),
    /// Application event (`42[...]`).
    Event(BackendEvent),
    /// Pong, noop, acks, and other packets we don't act on.
    Ignored,
}

/// Parse one text frame. Returns `None` for frames that are not valid
/// Engine.IO packets.
fn parse_packet(text: &str) -> Option<Packet> {
    let mut chars = text.chars();
    let packet = match chars.next()? {
        '0' => Packet::Open,
        '1' => Packet::Close,
        '2' => Packet::Ping,
        '3' | '5' | '6' => Packet::Ignored,
        '4' => return parse_socketio(chars.as_str()),
        _ => return None,
    };
    Some(packet)
}

fn parse_socketio(text: &str) -> Option<Packet> {
    let mut chars = text.chars();
    let kind = chars.next()?;
    let rest = strip_namespace(chars.as_str());

    match kind {
        '0' => Some(Packet::Connected),
        '1' => Some(Packet::Close),
        '2' => {
            // Optional ack id precedes the argument array.
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            parse_event(rest).map(Packet::Event)
        }
        '4' => {
            let reason = serde_json::from_str::<serde_json::Value>(rest)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| rest.to_owned());
            Some(Packet::ConnectError(reason))
        }
        '3' | '5' | '6' => Some(Packet::Ignored),
        _ => None,
    }
}

/// Drop a `/namespace,` prefix if present.
fn strip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        text.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

/// Decode `["name", arg...]` into a [`BackendEvent`].
fn parse_event(text: &str) -> Option<BackendEvent> {
    let serde_json::Value::Array(mut items) = serde_json::from_str(text).ok()? else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    let serde_json::Value::String(name) = items.remove(0) else {
        return None;
    };

    let payload = match items.len() {
        0 => serde_json::Value::Null,
        1 => items.remove(0),
        _ => serde_json::Value::Array(items),
    };

    Some(BackendEvent { name, payload })
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 +- 0.25)`
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_then_caps() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);
        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");

        let d20 = calculate_backoff(20, &config);
        assert!(d20 <= Duration::from_millis(12_500), "got {d20:?}");
    }

    #[test]
    fn socket_url_swaps_scheme_and_adds_query() {
        let http = socket_url(&Url::parse("http://studio.local:5000/").unwrap()).unwrap();
        assert_eq!(
            http.as_str(),
            "ws://studio.local:5000/socket.io/?EIO=4&transport=websocket"
        );

        let https = socket_url(&Url::parse("https://mix.example.org/base/").unwrap()).unwrap();
        assert_eq!(
            https.as_str(),
            "wss://mix.example.org/base/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn engine_io_control_packets() {
        assert_eq!(
            parse_packet(r#"0{"sid":"abc","pingInterval":25000}"#),
            Some(Packet::Open)
        );
        assert_eq!(parse_packet("2"), Some(Packet::Ping));
        assert_eq!(parse_packet("3"), Some(Packet::Ignored));
        assert_eq!(parse_packet("1"), Some(Packet::Close));
        assert_eq!(parse_packet(r#"40{"sid":"xyz"}"#), Some(Packet::Connected));
        assert_eq!(parse_packet(""), None);
        assert_eq!(parse_packet("hello"), None);
    }

    #[test]
    fn event_with_single_argument() {
        let frame = r#"42["output_create",[{"type":"device","id":"o-1","name":"hw:0"}]]"#;
        let Some(Packet::Event(event)) = parse_packet(frame) else {
            panic!("expected event packet");
        };
        assert_eq!(event.name, "output_create");
        assert_eq!(
            event.payload,
            json!([{ "type": "device", "id": "o-1", "name": "hw:0" }])
        );
    }

    #[test]
    fn event_with_namespace_and_ack_id() {
        let frame = r#"42/audio,17["mixer_remove",{"id":"m-2"}]"#;
        let Some(Packet::Event(event)) = parse_packet(frame) else {
            panic!("expected event packet");
        };
        assert_eq!(event.name, "mixer_remove");
        assert_eq!(event.payload, json!({ "id": "m-2" }));
    }

    #[test]
    fn event_argument_folding() {
        let none = parse_event(r#"["ping_me"]"#).unwrap();
        assert_eq!(none.payload, serde_json::Value::Null);

        let many = parse_event(r#"["pair",1,2]"#).unwrap();
        assert_eq!(many.payload, json!([1, 2]));

        assert!(parse_event(r#"[42]"#).is_none());
        assert!(parse_event("[]").is_none());
        assert!(parse_event("not json").is_none());
    }

    #[test]
    fn connect_error_extracts_message() {
        assert_eq!(
            parse_packet(r#"44{"message":"Not authorized"}"#),
            Some(Packet::ConnectError("Not authorized".into()))
        );
    }
}
