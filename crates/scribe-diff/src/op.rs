//! Diff operations and normalized diff sequences.

use serde::{Deserialize, Serialize};

/// The kind of a single diff operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Text present only in the old content.
    Delete,
    /// Text present in both old and new content.
    Equal,
    /// Text present only in the new content.
    Insert,
}

/// A tagged run of text: what happens to `text` when moving from old to new.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp {
    pub kind: OpKind,
    pub text: String,
}

impl DiffOp {
    pub fn new(kind: OpKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(OpKind::Delete, text)
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(OpKind::Equal, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(OpKind::Insert, text)
    }

    /// Length of the text in characters (the unit offsets are measured in).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns `true` if this op contributes to the old content.
    pub fn in_source(&self) -> bool {
        matches!(self.kind, OpKind::Delete | OpKind::Equal)
    }

    /// Returns `true` if this op contributes to the new content.
    pub fn in_target(&self) -> bool {
        matches!(self.kind, OpKind::Equal | OpKind::Insert)
    }
}

/// An ordered, normalized list of diff operations.
///
/// Invariants (upheld by every constructor in this crate):
/// - no op has empty text;
/// - no two adjacent ops share the same [`OpKind`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffSequence {
    ops: Vec<DiffOp>,
}

impl DiffSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from arbitrary ops, normalizing them with [`cleanup`].
    ///
    /// [`cleanup`]: crate::cleanup
    pub fn from_ops(ops: Vec<DiffOp>) -> Self {
        Self {
            ops: crate::engine::cleanup(ops),
        }
    }

    /// The ops in order.
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    /// Consume the sequence and return its ops.
    pub fn into_ops(self) -> Vec<DiffOp> {
        self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffOp> {
        self.ops.iter()
    }

    /// Returns `true` if the sequence has no ops (both sides were empty).
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of ops.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if the sequence changes nothing.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| op.kind == OpKind::Equal)
    }

    /// Reconstruct the old content from the `Equal` and `Delete` ops.
    pub fn source_text(&self) -> String {
        self.ops
            .iter()
            .filter(|op| op.in_source())
            .map(|op| op.text.as_str())
            .collect()
    }

    /// Reconstruct the new content from the `Equal` and `Insert` ops.
    pub fn target_text(&self) -> String {
        self.ops
            .iter()
            .filter(|op| op.in_target())
            .map(|op| op.text.as_str())
            .collect()
    }

    /// Total characters inserted.
    pub fn inserted_chars(&self) -> usize {
        self.count_chars(OpKind::Insert)
    }

    /// Total characters deleted.
    pub fn deleted_chars(&self) -> usize {
        self.count_chars(OpKind::Delete)
    }

    fn count_chars(&self, kind: OpKind) -> usize {
        self.ops
            .iter()
            .filter(|op| op.kind == kind)
            .map(DiffOp::char_len)
            .sum()
    }
}

impl<'a> IntoIterator for &'a DiffSequence {
    type Item = &'a DiffOp;
    type IntoIter = std::slice::Iter<'a, DiffOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl IntoIterator for DiffSequence {
    type Item = DiffOp;
    type IntoIter = std::vec::IntoIter<DiffOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
