//! Error types for the host link.

use thiserror::Error;
use xbee_frame::ProtocolError;

/// Errors that can occur while running the link.
#[derive(Debug, Error)]
pub enum HostError {
    /// I/O error on the transport or a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport failed while the decoder was reading from it.
    #[error("transport error: {0}")]
    Transport(std::io::Error),

    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config values are invalid.
    #[error("invalid config: {0}")]
    Config(String),

    /// A frame could not be built.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Process setup failed (signal handler, logging).
    #[error("setup failed: {0}")]
    Setup(String),
}

impl HostError {
    /// Create an invalid config error.
    pub fn config(message: impl Into<String>) -> Self {
        HostError::Config(message.into())
    }
}

/// Result type alias for host operations.
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostError::config("max_polls must be positive");
        assert!(err.to_string().contains("max_polls"));

        let err: HostError = ProtocolError::InvalidAddress("xyz".to_string()).into();
        assert!(err.to_string().contains("xyz"));
    }
}
