//! Error types for registration, handler execution and classification.
//!
//! Only [`RegistryError`] and [`ConfigError`] ever reach the caller of the
//! router; everything raised on the dispatch path is logged and folded into
//! an unresolved outcome by the coordinator.

use thiserror::Error;

/// Registration-time errors.
///
/// These are programmer errors and are expected to abort startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command '{0}' is already registered")]
    DuplicateName(String),

    #[error("Command '{0}' is not registered")]
    UnknownCommand(String),

    #[error("Skill command '{0}' was registered without a handler")]
    MissingHandler(String),

    #[error("The {0} fallback is already set")]
    FallbackAlreadySet(&'static str),
}

/// Failure reported by a command handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A nested owner found nothing to run.
    #[error("No command of '{0}' matched the request")]
    Unresolved(String),

    /// The turn was cancelled while the handler ran.
    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl HandlerError {
    /// Convenience constructor for message errors.
    pub fn message(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// Failure of the intent classification backend.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier returned an invalid answer: {0}")]
    InvalidAnswer(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}
