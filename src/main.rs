//! run-socket server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket and health endpoints.

use anyhow::Context;

use run_socket::config::SocketConfig;
use run_socket::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SocketConfig::from_env().context("failed to load configuration")?;

    logging::init(config.log_format);
    tracing::info!(addr = %config.listen_addr, log_format = %config.log_format, "starting run-socket");

    server::serve(&config, server::shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}
