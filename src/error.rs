//! Error types for fsod-runner
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur while orchestrating a run
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Invalid or inconsistent configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// External program could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External program ran but exited unsuccessfully
    #[error("{stage} failed with exit code {code:?}: {command}")]
    CommandFailed {
        stage: String,
        command: String,
        code: Option<i32>,
    },

    /// External program exceeded its time limit
    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    /// Sampler iteration exited unsuccessfully, remaining seeds were skipped
    #[error("Sampler failed on seed {seed} (exit code {code:?}), remaining seeds skipped")]
    SamplerFailed { seed: u32, code: Option<i32> },

    /// A checkpoint the pipeline depends on does not exist
    #[error("Checkpoint not found: {}", .0.display())]
    MissingCheckpoint(PathBuf),

    /// Zip archive creation error
    #[error("Archive error: {0}")]
    Archive(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<zip::result::ZipError> for RunnerError {
    fn from(err: zip::result::ZipError) -> Self {
        RunnerError::Archive(err.to_string())
    }
}

/// Result type alias for fsod-runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
