//! Error types module
//!
//! All failures raised while building or signing Imbo URLs are unified under
//! [`ImboError`]. Errors are raised synchronously at the call that introduced
//! the bad value; a failed call never leaves partial state behind.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like argument validation failures
    Debug,
    /// Warning level - for configuration problems that stop a client from starting
    Warn,
}

/// Metadata describing how an error should be reported by callers
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "INVALID_ARGUMENT")
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImboError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ImboError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ImboError::InvalidArgument(message.into())
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ImboError::InvalidConfiguration(message.into())
    }
}

impl ErrorMetadata for ImboError {
    fn error_code(&self) -> &'static str {
        match self {
            ImboError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ImboError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ImboError::InvalidArgument(_) => LogLevel::Debug,
            ImboError::InvalidConfiguration(_) => LogLevel::Warn,
        }
    }
}

pub type ImboResult<T> = Result<T, ImboError>;
