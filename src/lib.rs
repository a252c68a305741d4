//! # run-socket
//!
//! Real-time WebSocket endpoint with two event listeners per connection.
//!
//! Clients send JSON envelopes (`{"event": "...", "data": ...}`). A `run`
//! event logs `run: <payload as JSON>`. A `disconnect` event, a Close
//! frame, a dropped socket, or server shutdown logs `user disconnected`
//! exactly once and ends the connection.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)
//!     │     └── connection loop: run / disconnect listeners
//!     ├── System routes (api/)
//!     │
//!     └── ConnectionRegistry (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod server;
pub mod ws;
