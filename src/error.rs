//! Error types for the advisory chat service

use thiserror::Error;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {

    // =============================
    // Completion Pipeline Errors
    // =============================

    /// A required setting (the API key) is absent. Never reaches the network.
    #[error("{0}")]
    Configuration(String),

    /// DNS, connection, timeout or body-read failure.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx status or a 2xx body without a usable choice.
    #[error("{0}")]
    Protocol(String),

    // =============================
    // Financial Data Store Errors
    // =============================

    #[error("Financial data store error: {0}")]
    Store(String),
}

/// Coarse classification used in logs and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Protocol,
    Store,
}

impl AdvisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdvisorError::Configuration(_) => ErrorKind::Configuration,
            AdvisorError::Transport(_) => ErrorKind::Transport,
            AdvisorError::Protocol(_) => ErrorKind::Protocol,
            AdvisorError::Store(_) => ErrorKind::Store,
        }
    }
}
