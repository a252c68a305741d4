//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The connection is registered before the 101 response goes out, so a
/// shutdown drain started right after the handshake still waits for it.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let registry = Arc::clone(&state.registry);
    let conn_id = registry.register().await;
    let shutdown = state.shutdown_receiver();
    let failed_registry = Arc::clone(&registry);

    ws.max_message_size(state.max_message_bytes)
        .on_failed_upgrade(move |err| {
            tracing::warn!(error = %err, %conn_id, "websocket upgrade failed");
            tokio::spawn(async move {
                failed_registry.unregister(conn_id).await;
            });
        })
        .on_upgrade(move |socket| run_connection(socket, conn_id, registry, shutdown))
}
