//! Error taxonomy for the chat core.
//!
//! Nothing in here escapes the session as a crash: ingest and send errors are
//! reported to the caller before any state changes, transport errors are turned
//! into an assistant message by the session.

use std::path::PathBuf;

/// Shown when the backend failed without a usable `detail`.
pub const GENERIC_FAILURE: &str = "An error occurred while processing.";

/// Errors from reading a user-selected file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unsupported file type: {path} ({reason}); please upload a valid text file")]
    UnsupportedFileType { path: PathBuf, reason: String },
    #[error("file is {size} bytes, above the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a send action was rejected without touching the transcript.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("nothing to send")]
    EmptyInput,
    #[error("a request is already in flight")]
    Busy,
    #[error("message is {size} bytes, above the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Failures talking to the advisory backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("backend returned {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl TransportError {
    /// The text the user sees for this failure: the server's `detail` verbatim
    /// when it sent one, otherwise the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Errors loading or validating the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
