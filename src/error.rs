use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DseectlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_yml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pre-flight check failed; no external command was run.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The vendor tool returned an exit code outside the acceptable set.
    #[error("Command '{command}' exited with status {status}: {stderr}")]
    ExecutionFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// Vendor binary could not be resolved. The only retryable failure:
    /// the tool may not be on PATH yet while installation is still settling.
    #[error("Command '{0}' not found on this system")]
    ToolMissing(String),

    #[error("Command '{command}' timed out after {seconds} seconds")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Unknown registry kind '{0}', expected 'agents' or 'servers'")]
    InvalidRegistryKind(String),

    #[error("Unable to materialize secret file: {0}")]
    SecretMaterialization(String),

    /// Lock acquisition failed (e.g., mutex poisoned)
    #[error("Lock acquisition failed: {0}")]
    Lock(String),

    #[error("{0}")]
    Other(String),
}

impl DseectlError {
    /// Only tool-missing failures are worth retrying; everything else is
    /// either a logical failure or a condition a retry cannot fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ToolMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, DseectlError>;
