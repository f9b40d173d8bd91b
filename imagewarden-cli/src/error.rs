//! CLI-specific error types and exit code mapping

use imagewarden_core::error::{AuditError, WardenError};
use imagewarden_policy::ImagePolicyError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Cannot reach the Docker daemon.
    #[error("docker not reachable: {0}")]
    DockerUnavailable(String),

    /// The audit flagged images and `--fail-on-flagged` was set.
    #[error("{0} flagged image(s) found")]
    FlaggedImages(usize),

    /// Invalid mode, pattern or pattern file.
    #[error("policy error: {0}")]
    Policy(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | General / command error                  |
    /// | 2    | Configuration error                      |
    /// | 3    | Docker unreachable                       |
    /// | 4    | Flagged images found (`--fail-on-flagged`) |
    /// | 5    | Invalid pattern, mode or pattern file    |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::DockerUnavailable(_) => 3,
            Self::FlaggedImages(_) => 4,
            Self::Policy(_) => 5,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<WardenError> for CliError {
    fn from(e: WardenError) -> Self {
        match e {
            WardenError::Config(e) => Self::Config(e.to_string()),
            WardenError::Audit(AuditError::Docker(msg)) => Self::Command(msg),
            WardenError::Audit(e) => Self::Policy(e.to_string()),
            WardenError::Io(e) => Self::Io(e),
        }
    }
}

impl From<ImagePolicyError> for CliError {
    fn from(e: ImagePolicyError) -> Self {
        match e {
            ImagePolicyError::DockerConnection(msg) => Self::DockerUnavailable(msg),
            ImagePolicyError::DockerApi(_) | ImagePolicyError::ImageNotFound(_) => {
                Self::Command(e.to_string())
            }
            ImagePolicyError::InvalidMode(_)
            | ImagePolicyError::PatternCompilation { .. }
            | ImagePolicyError::PatternFileLoad { .. } => Self::Policy(e.to_string()),
        }
    }
}
