//! CLI error type and exit code mapping

use minerva_core::error::{MinervaError, StageError};
use minerva_image_builder::ImageError;

/// Everything a binary can fail with.
///
/// Domain errors keep their own exit codes so the process exits with the
/// code of the first failing command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Config, stage or I/O failure from the shared pipeline crate.
    #[error("{0}")]
    Minerva(#[from] MinervaError),

    /// Image build, smoke test or publish failure.
    #[error("{0}")]
    Image(#[from] ImageError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Writing output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StageError> for CliError {
    fn from(err: StageError) -> Self {
        Self::Minerva(err.into())
    }
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Every scheduled stage succeeded          |
    /// | N    | First failing command exited with N      |
    /// | 1    | Missing prerequisite, or killed by signal |
    /// | 2    | Configuration error                      |
    /// | 127  | A command could not be started           |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Minerva(e) => e.exit_code(),
            Self::Image(e) => e.exit_code(),
            Self::JsonSerialize(_) | Self::Io(_) => 1,
        }
    }
}
