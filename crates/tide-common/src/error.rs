//! Error types for tidecast services.

use thiserror::Error;

/// Result type alias using TideError.
pub type TideResult<T> = Result<T, TideError>;

/// Primary error type for tide operations.
#[derive(Debug, Error)]
pub enum TideError {
    // === Validation Errors ===
    #[error("{0}")]
    InvalidCoordinates(String),

    #[error("{0}")]
    InvalidRange(String),

    #[error("station not found: {0}")]
    StationNotFound(String),

    #[error("{0}")]
    InvalidRecord(String),

    // === Upstream Errors ===
    #[error("upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("decoding upstream response: {0}")]
    Decode(String),

    // === Cache Errors ===
    #[error("remote cache error: {0}")]
    RemoteCache(String),

    // === Infrastructure Errors ===
    #[error("internal error: {0}")]
    Internal(String),
}

impl TideError {
    /// Construct an upstream error from an HTTP status and message.
    pub fn upstream(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        TideError::Upstream {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable tag for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TideError::InvalidCoordinates(_) => "invalid-coordinates",
            TideError::InvalidRange(_) => "invalid-range",
            TideError::StationNotFound(_) => "station-not-found",
            TideError::InvalidRecord(_) => "invalid-record",
            TideError::Upstream { .. } => "upstream-error",
            TideError::Decode(_) => "decode-error",
            TideError::RemoteCache(_) => "remote-cache-error",
            TideError::Internal(_) => "internal-error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            TideError::InvalidCoordinates(_) | TideError::InvalidRange(_) => 400,

            TideError::StationNotFound(_) => 404,

            TideError::Upstream { .. } => 502,

            TideError::InvalidRecord(_)
            | TideError::Decode(_)
            | TideError::RemoteCache(_)
            | TideError::Internal(_) => 500,
        }
    }
}

// Conversion from common error types
impl From<serde_json::Error> for TideError {
    fn from(err: serde_json::Error) -> Self {
        TideError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for TideError {
    fn from(err: std::io::Error) -> Self {
        TideError::Internal(err.to_string())
    }
}
