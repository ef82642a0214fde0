//! CLI-specific error types and exit code mapping.

use evsub_core::SubscriptionError;
use evsub_sse::SseError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or control-command error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (stdin closed unexpectedly, stdout gone, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The subscription could not be established.
    #[error("Subscription failed: {0}")]
    Subscription(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,     // EX_USAGE
            Self::Subscription(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,           // EX_IOERR
            Self::Config(_) => 78,       // EX_CONFIG
        }
    }
}

impl From<SseError> for CliError {
    fn from(err: SseError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SubscriptionError> for CliError {
    fn from(err: SubscriptionError) -> Self {
        Self::Subscription(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
