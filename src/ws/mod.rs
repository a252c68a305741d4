//! WebSocket layer: upgrade handling, frame decoding, and the per-connection
//! `run` / `disconnect` listeners.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod stringify;
