//! Router composition and the serve loop with graceful shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::SocketConfig;
use crate::domain::ConnectionRegistry;
use crate::error::SocketError;
use crate::ws::handler::ws_handler;

/// Builds the complete application: HTTP routes plus the WebSocket route
/// at `ws_path`.
pub fn build_app(state: AppState, ws_path: &str) -> Router {
    Router::new()
        .merge(api::build_router())
        .route(ws_path, get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `config.listen_addr` and serves until `signal` resolves.
///
/// # Errors
///
/// Returns [`SocketError::Io`] if the listener cannot be bound or the
/// server fails.
pub async fn serve<F>(config: &SocketConfig, signal: F) -> Result<(), SocketError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, ws_path = %config.ws_path, "server listening");

    let state = AppState::new(config.max_message_bytes);
    serve_on(listener, state, &config.ws_path, signal).await
}

/// Serves on an already bound listener.
///
/// When `signal` resolves, every open WebSocket gets its `disconnect`
/// listener fired and the HTTP server drains.
///
/// # Errors
///
/// Returns [`SocketError::Io`] if the server fails.
pub async fn serve_on<F>(
    listener: TcpListener,
    state: AppState,
    ws_path: &str,
    signal: F,
) -> Result<(), SocketError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    let app = build_app(state.clone(), ws_path);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("shutdown requested");
            state.trigger_shutdown();
        })
        .await?;

    drain_connections(&registry, DRAIN_TIMEOUT).await;
    Ok(())
}

/// How long shutdown waits for WebSocket loops to finish.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Waits until every connection has unregistered, or `timeout` elapses.
async fn drain_connections(registry: &ConnectionRegistry, timeout: Duration) {
    if tokio::time::timeout(timeout, registry.wait_idle()).await.is_err() {
        let remaining = registry.active_count().await;
        tracing::warn!(remaining, "connections still open after drain timeout");
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
