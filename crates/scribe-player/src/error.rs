//! Error types for the edit player.

use crate::player::FallbackReason;

/// Errors raised by an [`EditableDocument`](crate::EditableDocument).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The underlying document was closed or disposed.
    #[error("document is closed")]
    Closed,

    /// An offset fell outside the current content.
    #[error("offset {offset} out of range for document of {len} characters")]
    OutOfRange { offset: usize, len: usize },

    /// The host refused the edit for its own reasons.
    #[error("edit rejected: {0}")]
    Rejected(String),
}

/// Result alias for document capability calls.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors surfaced from a replay call.
///
/// Capability failures during animation are recovered locally and never
/// show up here; only a failed or unconfirmed final write does.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The corrective full-content write after an interrupted or mismatched
    /// animation failed.
    #[error("corrective write after {reason} failed: {source}")]
    FallbackWrite {
        reason: FallbackReason,
        #[source]
        source: DocumentError,
    },

    /// The non-animated write requested by disabled timing failed.
    #[error("direct write failed: {0}")]
    DirectWrite(#[source] DocumentError),

    /// The document could not be read back after a full write.
    #[error("could not read document after full write: {0}")]
    Unreadable(#[source] DocumentError),

    /// A full write reported success but the document does not hold the
    /// target text.
    #[error("document does not hold the target text after a full write")]
    Unverified,
}

/// Result alias for replay calls.
pub type ReplayResult<T> = Result<T, ReplayError>;
