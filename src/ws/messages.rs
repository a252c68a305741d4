//! WebSocket message types: the event envelope and the events it decodes to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::stringify::to_js_string;
use crate::error::{ErrorBody, SocketError};

/// Event name for the `run` listener.
pub const RUN_EVENT: &str = "run";
/// Event name for the `disconnect` listener.
pub const DISCONNECT_EVENT: &str = "disconnect";
/// Event name the server uses for error frames.
pub const ERROR_EVENT: &str = "error";

/// JSON envelope carried by every frame, in both directions.
///
/// ```json
/// { "event": "run", "data": { "id": 1 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name.
    pub event: String,
    /// Arbitrary payload. Missing on the wire means `null`.
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Builds the `error` frame reported for a rejected client frame.
    #[must_use]
    pub fn error(err: &SocketError) -> Self {
        let ErrorBody { code, message } = err.to_body();
        Self {
            event: ERROR_EVENT.to_string(),
            data: serde_json::json!({ "code": code, "message": message }),
        }
    }
}

/// An event received from a client, after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// `run` with its untouched payload.
    Run(Value),
    /// Client-initiated `disconnect`. Any payload is ignored.
    Disconnect,
    /// Any other event name. No listener is bound to it.
    Unknown(String),
}

impl ClientEvent {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::MalformedFrame`] if the text is not a JSON
    /// object with a string `event` field.
    pub fn decode(text: &str) -> Result<Self, SocketError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Ok(Self::from(envelope))
    }

    /// Decodes a binary frame holding UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::NonUtf8Frame`] for non-UTF-8 bytes and
    /// [`SocketError::MalformedFrame`] as for [`ClientEvent::decode`].
    pub fn decode_binary(bytes: &[u8]) -> Result<Self, SocketError> {
        let text = std::str::from_utf8(bytes).map_err(|_| SocketError::NonUtf8Frame)?;
        Self::decode(text)
    }
}

impl From<Envelope> for ClientEvent {
    fn from(envelope: Envelope) -> Self {
        match envelope.event.as_str() {
            RUN_EVENT => Self::Run(envelope.data),
            DISCONNECT_EVENT => Self::Disconnect,
            _ => Self::Unknown(envelope.event),
        }
    }
}

/// Text logged by the `run` listener: `run: ` followed by compact JSON,
/// numbers printed as ECMAScript would.
#[must_use]
pub fn run_log_line(payload: &Value) -> String {
    format!("run: {}", to_js_string(payload))
}
