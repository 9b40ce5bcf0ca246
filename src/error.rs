//! Error types for pomodoro-flow

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the outer layers. The session controller itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings rejected at the input boundary
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    /// Config file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),

    #[error("Notification error: {0}")]
    Notification(String),

    /// The session task has stopped and no longer accepts commands
    #[error("Session closed")]
    SessionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for pomodoro-flow operations
pub type Result<T> = std::result::Result<T, Error>;
