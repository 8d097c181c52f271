//! Error types for the VITS plugin.
//!
//! Every failure is local to a single invocation. [`ErrorKind`] groups the variants
//! into the classes the adapters report on.

use thiserror::Error;

/// Result type for VITS plugin operations.
pub type Result<T> = std::result::Result<T, VitsError>;

/// Failure class of a [`VitsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input (empty or oversized text).
    Input,
    /// Timeout or connection level failure.
    Transport,
    /// The API answered with a non-200 status.
    Server,
    /// The API answered 200 but the body cannot be a real clip.
    Integrity,
    /// Anything else: local I/O, host capability failures, panics.
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "INPUT_ERROR"),
            Self::Transport => write!(f, "TRANSPORT_ERROR"),
            Self::Server => write!(f, "SERVER_ERROR"),
            Self::Integrity => write!(f, "INTEGRITY_ERROR"),
            Self::Unexpected => write!(f, "UNEXPECTED_ERROR"),
        }
    }
}

/// Errors that can occur while synthesizing or replying.
#[derive(Error, Debug)]
pub enum VitsError {
    /// Text was empty after trimming.
    #[error("Missing text")]
    EmptyText,

    /// Text exceeds the configured maximum length.
    #[error("Text too long: {actual}/{limit}")]
    TextTooLong {
        /// Configured maximum, in characters.
        limit: usize,
        /// Actual length, in characters.
        actual: usize,
    },

    /// The request did not finish within the configured timeout.
    #[error("Request timed out after {seconds}s")]
    Timeout {
        /// Timeout that expired.
        seconds: u64,
    },

    /// Network error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-200 status.
    #[error("HTTP error {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Response body too small to be valid audio.
    #[error("Audio data too small, possibly corrupt: {size} bytes")]
    Integrity {
        /// Body size in bytes.
        size: usize,
    },

    /// Local file system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host capability (message send) failed.
    #[error("Host error: {0}")]
    Host(String),

    /// The invocation panicked.
    #[error("Panic during execution: {0}")]
    Panic(String),
}

impl VitsError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyText | Self::TextTooLong { .. } => ErrorKind::Input,
            Self::Timeout { .. } | Self::Network(_) => ErrorKind::Transport,
            Self::Server { .. } => ErrorKind::Server,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::Io(_) | Self::Config(_) | Self::Host(_) | Self::Panic(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Server)
    }

    /// Create a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a host capability error.
    pub fn host<S: Into<String>>(message: S) -> Self {
        Self::Host(message.into())
    }
}

impl From<toml::de::Error> for VitsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for VitsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Host(err.to_string())
    }
}
