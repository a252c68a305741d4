//! Per-connection event loop.
//!
//! Reads frames from one WebSocket, dispatches the `run` and `disconnect`
//! listeners, and guarantees the `disconnect` listener fires exactly once
//! no matter how the connection ends.

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::watch;
use tracing::Instrument;

use super::messages::{ClientEvent, Envelope, run_log_line};
use crate::domain::{ConnectionId, ConnectionRegistry};

/// Why a connection's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client sent a `disconnect` event.
    ClientRequested,
    /// The client sent a Close frame or the stream ended.
    ClientClosed,
    /// Reading from or writing to the socket failed.
    TransportError,
    /// The server is shutting down.
    ServerShutdown,
}

impl DisconnectReason {
    /// Whether the server should still send a Close frame.
    #[must_use]
    pub const fn server_closes(self) -> bool {
        matches!(self, Self::ClientRequested | Self::ServerShutdown)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClientRequested => "client_requested",
            Self::ClientClosed => "client_closed",
            Self::TransportError => "transport_error",
            Self::ServerShutdown => "server_shutdown",
        };
        f.write_str(s)
    }
}

/// Runs a single WebSocket connection until it disconnects.
///
/// `conn_id` must already be registered; it is unregistered when the loop
/// ends. The loop runs inside a `connection` span carrying the id.
pub async fn run_connection(
    socket: WebSocket,
    conn_id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    shutdown: watch::Receiver<bool>,
) {
    let span = tracing::info_span!("connection", conn_id = %conn_id);
    serve_connection(socket, conn_id, registry, shutdown)
        .instrument(span)
        .await;
}

async fn serve_connection(
    socket: WebSocket,
    conn_id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("a user connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let reason = loop {
        tokio::select! {
            msg = ws_rx.next() => {
                let decoded = match msg {
                    Some(Ok(Message::Text(text))) => ClientEvent::decode(&text),
                    Some(Ok(Message::Binary(bytes))) => ClientEvent::decode_binary(&bytes),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break DisconnectReason::ClientClosed,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "ws read failed");
                        break DisconnectReason::TransportError;
                    }
                };

                match decoded {
                    Ok(ClientEvent::Run(payload)) => {
                        on_run(&payload);
                        registry.record_run(conn_id).await;
                    }
                    Ok(ClientEvent::Disconnect) => break DisconnectReason::ClientRequested,
                    Ok(ClientEvent::Unknown(event)) => {
                        tracing::debug!(%event, "no listener bound for event");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "rejected client frame");
                        if send_envelope(&mut ws_tx, &Envelope::error(&err)).await.is_err() {
                            break DisconnectReason::TransportError;
                        }
                    }
                }
            }
            // A dropped sender also ends the connection.
            () = wait_for_shutdown(&mut shutdown) => break DisconnectReason::ServerShutdown,
        }
    };

    on_disconnect(reason);
    registry.unregister(conn_id).await;

    if reason.server_closes()
        && let Err(err) = ws_tx.send(Message::Close(None)).await
    {
        tracing::debug!(error = %err, "failed to send close frame");
    }
}

/// `run` listener.
fn on_run(payload: &Value) {
    tracing::info!("{}", run_log_line(payload));
}

/// `disconnect` listener.
fn on_disconnect(reason: DisconnectReason) {
    tracing::info!(%reason, "user disconnected");
}

/// Resolves once shutdown starts or the sender is gone.
///
/// The `watch::Ref` is not `Send`, so it must be dropped here rather than
/// handed to `select!`, whose output outlives the other branch's awaits.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stopped| *stopped).await.is_err() {
        tracing::debug!("shutdown sender dropped");
    }
}

fn encode_envelope(envelope: &Envelope) -> Option<String> {
    match serde_json::to_string(envelope) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::warn!(error = %err, event = %envelope.event, "failed to encode frame");
            None
        }
    }
}

/// Sends `envelope` as a text frame. Frames that fail to encode are
/// skipped.
async fn send_envelope(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    envelope: &Envelope,
) -> Result<(), axum::Error> {
    match encode_envelope(envelope) {
        Some(json) => ws_tx.send(Message::text(json)).await,
        None => Ok(()),
    }
}
