//! Error types for the suggestions engine.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation. None of these errors is fatal to the host:
//! the engine turns transport failures into an empty result and only
//! surfaces configuration errors while options are being loaded.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine has been disposed")]
    Disposed,
}

/// Failures reported by a [`Transport`](crate::transport::Transport).
///
/// Every variant is treated as an empty result set by the engine and is
/// never cached nor recorded as a bad query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Lookup timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Unexpected HTTP status {code}")]
    Status { code: u16 },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Lookup cancelled")]
    Cancelled,
}

/// Errors raised while loading or validating options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read options file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SuggestError>;

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Error code implementations for machine-readable error output
impl SuggestError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(e) => e.code(),
            Self::Config(e) => e.code(),
            Self::Json(_) => "JSON_ERROR",
            Self::Disposed => "DISPOSED",
        }
    }
}

impl TransportError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Status { .. } => "HTTP_STATUS",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl ConfigError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "INVALID_OPTION",
            Self::Parse(_) => "OPTIONS_PARSE_ERROR",
            Self::Io { .. } => "OPTIONS_IO_ERROR",
        }
    }
}
