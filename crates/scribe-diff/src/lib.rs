//! Diff engine for scribe.
//!
//! Turns an old and a new file content into a normalized sequence of
//! `Delete` / `Equal` / `Insert` runs that the edit player replays one
//! character at a time.
//!
//! # Key Types
//!
//! - [`DiffOp`] / [`OpKind`] / [`DiffSequence`] -- character-level edit runs
//! - [`compute_diff`] / [`cleanup`] -- coarse prefix/suffix diff and normalization
//! - [`LineStats`] / [`ChangePreview`] -- line-level counts and unified hunks for reports

pub mod engine;
pub mod op;
pub mod preview;

pub use engine::{cleanup, compute_diff, is_normalized};
pub use op::{DiffOp, DiffSequence, OpKind};
pub use preview::{preview_text, ChangePreview, LineStats, PreviewHunk, PreviewLine, CONTEXT_LINES};
