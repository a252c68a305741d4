//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::SocketError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = SocketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(SocketError::InvalidConfig {
                key: "LOG_FORMAT",
                reason: format!("unknown format `{other}` (expected `text` or `json`)"),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`SocketConfig::from_env`].
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Route the WebSocket upgrade is served on.
    pub ws_path: String,

    /// Largest WebSocket message accepted from a client, in bytes.
    pub max_message_bytes: usize,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_path: "/ws".to_string(),
            max_message_bytes: 1024 * 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl SocketConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// See [`SocketConfig::from_lookup`].
    pub fn from_env() -> Result<Self, SocketError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to [`SocketConfig::default`]. Numeric keys
    /// that fail to parse also fall back to their default.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::InvalidConfig`] if `LISTEN_ADDR` is not a
    /// socket address, `WS_PATH` is relative or shadows an HTTP route,
    /// `MAX_MESSAGE_BYTES` is `0`, or `LOG_FORMAT` is neither `text` nor
    /// `json`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SocketError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw.parse().map_err(|e| SocketError::InvalidConfig {
                key: "LISTEN_ADDR",
                reason: format!("`{raw}`: {e}"),
            })?,
            None => defaults.listen_addr,
        };

        let ws_path = match lookup("WS_PATH") {
            Some(path) => validate_ws_path(path)?,
            None => defaults.ws_path,
        };

        let max_message_bytes = parse_or(&lookup, "MAX_MESSAGE_BYTES", defaults.max_message_bytes);
        if max_message_bytes == 0 {
            return Err(SocketError::InvalidConfig {
                key: "MAX_MESSAGE_BYTES",
                reason: "must be greater than zero".to_string(),
            });
        }

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            listen_addr,
            ws_path,
            max_message_bytes,
            log_format,
        })
    }
}

/// Paths owned by the HTTP routes; the WebSocket route must not shadow them.
const RESERVED_PREFIXES: [&str; 3] = ["/health", "/api-docs", "/swagger-ui"];

fn validate_ws_path(path: String) -> Result<String, SocketError> {
    if !path.starts_with('/') {
        return Err(SocketError::InvalidConfig {
            key: "WS_PATH",
            reason: format!("`{path}` must start with '/'"),
        });
    }
    if RESERVED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return Err(SocketError::InvalidConfig {
            key: "WS_PATH",
            reason: format!("`{path}` collides with an HTTP route"),
        });
    }
    Ok(path)
}

/// Parses `key` as `T`, returning `default` on missing or invalid values.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
