use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CmrError {
    #[error("CMR request failed: {0}")]
    Transport(String),

    #[error("CMR returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("CMR paging contract violated: {0}")]
    Protocol(String),

    #[error("cached result at {path} is unreadable: {message}")]
    CacheCorrupt { path: String, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cannot derive {kind} name from {value:?}: {message}")]
    #[diagnostic(help("pass --skip-misnamed to skip entries that break the naming convention"))]
    NameDerivation {
        kind: &'static str,
        value: String,
        message: String,
    },

    #[error("invalid concept id: {0}")]
    InvalidConceptId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CmrError {
    /// Cache read failures that a live fetch can repair.
    pub fn is_recoverable_cache_error(&self) -> bool {
        matches!(self, CmrError::CacheCorrupt { .. } | CmrError::Storage(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CmrError::Transport(_) | CmrError::Status { .. } | CmrError::Protocol(_)
        )
    }
}
