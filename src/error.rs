//! Error types for the probe engine.

use thiserror::Error;

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors that can occur while probing a login service.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Socket level failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply was not a well-formed `{"result": ...}` object.
    #[error("Malformed reply: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reply bytes were not valid UTF-8.
    #[error("Reply is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Send or receive attempted while the connection is closed.
    #[error("Connection to {addr} is closed")]
    ConnectionClosed { addr: String },

    /// The remote end closed the stream.
    #[error("Remote {addr} closed the connection")]
    Disconnected { addr: String },

    /// Every candidate login was rejected.
    #[error("No valid login found after trying {tried} candidate(s)")]
    LoginNotFound { tried: usize },

    /// The password generator ran dry before the success reply.
    #[error("Candidate space exhausted after {attempts} attempt(s)")]
    CandidatesExhausted { attempts: u64 },

    /// The configured attempt bound was hit.
    #[error("Gave up after reaching the attempt limit of {limit}")]
    AttemptLimitReached { limit: u64 },

    #[error("Invalid charset spec '{0}' (use any of 'a', 'A', '0', '.' or 'all')")]
    InvalidCharset(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProbeError {
    pub fn closed(addr: impl Into<String>) -> Self {
        ProbeError::ConnectionClosed { addr: addr.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ProbeError::Config(msg.into())
    }
}
