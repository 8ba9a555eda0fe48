//! Error types for plans, file stores and sessions.

use crate::session::PanelId;

/// Errors from [`FileStore`](crate::FileStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    /// The path escapes the workspace or is otherwise unusable.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The file exists but is not UTF-8 text.
    #[error("file is not valid UTF-8: {0}")]
    NotUtf8(String),

    /// I/O error from the underlying file system.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for file store operations.
pub type FileStoreResult<T> = Result<T, FileStoreError>;

/// Errors that can occur while validating or executing an edit plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid {kind} operation on '{path}': {reason}")]
    InvalidOperation {
        kind: String,
        path: String,
        reason: String,
    },

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("search text not found in {0}")]
    SearchNotFound(String),

    #[error("malformed plan: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] FileStoreError),

    #[error("replay error: {0}")]
    Replay(#[from] scribe_player::ReplayError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("session not found: {0}")]
    SessionNotFound(PanelId),
}

/// Result alias for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;
