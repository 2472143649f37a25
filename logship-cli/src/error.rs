//! CLI-specific error types and exit code mapping

use logship_core::error::LogshipError;
use logship_publisher::PublishError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Logging or metrics setup failed.
    #[error("setup error: {0}")]
    Setup(String),

    /// The sink could not be initialized (bad credentials, bad host).
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    /// Publishing failed after the sink was initialized.
    #[error("publish error: {0}")]
    Publish(String),

    /// IO error (opening or reading the input).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | Publish or setup error          |
    /// | 2    | Configuration error             |
    /// | 3    | Sink could not be initialized   |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::SinkUnavailable(_) => 3,
            Self::Io(_) => 10,
            Self::Setup(_) | Self::Publish(_) => 1,
        }
    }
}

impl From<LogshipError> for CliError {
    fn from(e: LogshipError) -> Self {
        match e {
            LogshipError::Config(inner) => Self::Config(inner.to_string()),
            LogshipError::Io(inner) => Self::Io(inner),
            other => Self::Publish(other.to_string()),
        }
    }
}

impl From<PublishError> for CliError {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::Init { .. } => Self::SinkUnavailable(e.to_string()),
            PublishError::Config { .. } => Self::Config(e.to_string()),
            PublishError::Io(inner) => Self::Io(inner),
            other => Self::Publish(other.to_string()),
        }
    }
}
