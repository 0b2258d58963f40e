//! Error types for the deployment configuration resolver.

use thiserror::Error;

/// Errors raised while resolving a configuration key
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Missing configuration key: {0}")]
    MissingKey(String),

    /// A key was requested while its own evaluation was still running.
    /// Never returned from the public `Context` API; it becomes `MissingKey`.
    #[error("Recursive lookup of configuration key: {0}")]
    RecursionDetected(String),

    #[error("Prompt for '{key}' aborted: {reason}")]
    PromptAborted { key: String, reason: String },

    #[error("Could not substitute placeholder '{placeholder}' in '{key}'")]
    InterpolationFailure { key: String, placeholder: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Local path error: {0}")]
    LocalPath(String),
}

impl ResolveError {
    /// Errors that abort the enclosing task once every fallback is exhausted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResolveError::MissingKey(_) | ResolveError::PromptAborted { .. }
        )
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ResolveError::MissingKey(_))
    }
}

/// Crate-level errors: configuration loading, logging setup and resolution
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<config::ConfigError> for DeployError {
    fn from(err: config::ConfigError) -> Self {
        DeployError::ConfigError(err.to_string())
    }
}
