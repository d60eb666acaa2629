//! Error types for stackforge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate stack: {0}")]
    DuplicateStack(String),

    #[error("duplicate logical id in stack '{stack}': {logical_id}")]
    DuplicateLogicalId { stack: String, logical_id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("removal policy conflict on '{0}': RETAIN forbids auto-delete")]
    PolicyConflict(String),

    #[error("stage '{stage}' consumes unknown artifact '{artifact}'")]
    UnknownArtifact { stage: String, artifact: String },

    #[error("artifact '{0}' is produced by more than one action")]
    DuplicateArtifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
