//! Error types for the relay daemon

use thiserror::Error;

/// Main error type for the relay daemon
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to listen on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Message parsing error: {0}")]
    MessageParse(String),

    #[error("Framing error: {0}")]
    Framing(#[from] FrameError),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Failures raised while cutting a session's byte stream into lines
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("input line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(format!("Failed to parse config file: {}", e))
    }
}
