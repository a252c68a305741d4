//! Service error types with numeric code mapping.
//!
//! [`SocketError`] is the central error type for the service. Each variant
//! maps to a numeric code that is reported to WebSocket clients inside an
//! `error` frame.

use serde::Serialize;

/// Body of an `error` frame sent back to a WebSocket client.
///
/// ```json
/// {
///   "code": 1001,
///   "message": "malformed frame: expected value at line 1 column 1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Service error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category      |
/// |-----------|---------------|
/// | 1000–1999 | Client frames |
/// | 2000–2999 | Configuration |
/// | 3000–3999 | Server        |
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// A frame could not be decoded as an event envelope.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    /// A binary frame did not contain UTF-8 text.
    #[error("malformed frame: binary payload is not valid UTF-8")]
    NonUtf8Frame,

    /// An environment variable held an unusable value.
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfig {
        /// Name of the offending variable.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Socket or listener I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SocketError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedFrame(_) => 1001,
            Self::NonUtf8Frame => 1002,
            Self::InvalidConfig { .. } => 2001,
            Self::Io(_) => 3001,
        }
    }

    /// Builds the client-facing body for this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
        }
    }
}
