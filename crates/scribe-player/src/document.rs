//! The editable document capability and an in-memory implementation.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DocumentError, DocumentResult};

/// A live document that accepts small, immediately-applied edits.
///
/// Offsets are character offsets into the current content. Every call is
/// atomic on its own; the player never needs multi-unit atomic edits.
///
/// The trait is object-safe and `Send + Sync` so documents can be passed
/// around as `&dyn EditableDocument` or `Arc<dyn EditableDocument>`.
#[async_trait]
pub trait EditableDocument: Send + Sync {
    /// Insert a single unit at `offset`.
    async fn insert_at(&self, offset: usize, unit: char) -> DocumentResult<()>;

    /// Delete the characters in `start..end`.
    async fn delete_range(&self, start: usize, end: usize) -> DocumentResult<()>;

    /// The current materialized content.
    async fn text(&self) -> DocumentResult<String>;

    /// Replace the whole content in one edit.
    async fn replace_all(&self, text: &str) -> DocumentResult<()>;
}

#[derive(Debug, Default)]
struct BufferState {
    text: String,
    closed: bool,
    edits: usize,
}

/// A `String`-backed document.
///
/// Used for tests, for headless callers that persist the final text
/// themselves, and as a stand-in for an editor buffer.
#[derive(Debug, Default)]
pub struct InMemoryDocument {
    state: Mutex<BufferState>,
}

impl InMemoryDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(BufferState {
                text: text.into(),
                ..Default::default()
            }),
        }
    }

    /// Snapshot of the current content, regardless of whether it is closed.
    pub fn snapshot(&self) -> String {
        self.state.lock().expect("lock poisoned").text.clone()
    }

    /// Close the document; every later call fails with [`DocumentError::Closed`].
    pub fn close(&self) {
        self.state.lock().expect("lock poisoned").closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("lock poisoned").closed
    }

    /// Number of successful edits applied so far (inserts, deletes and replaces).
    pub fn edit_count(&self) -> usize {
        self.state.lock().expect("lock poisoned").edits
    }

    fn with_open<T>(&self, f: impl FnOnce(&mut BufferState) -> DocumentResult<T>) -> DocumentResult<T> {
        let mut state = self.state.lock().expect("lock poisoned");
        if state.closed {
            return Err(DocumentError::Closed);
        }
        f(&mut state)
    }
}

/// Byte index of the `offset`-th character, allowing one-past-the-end.
fn byte_index(text: &str, offset: usize) -> DocumentResult<usize> {
    if offset == 0 {
        return Ok(0);
    }
    let mut chars = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    chars.nth(offset).ok_or(DocumentError::OutOfRange {
        offset,
        len: text.chars().count(),
    })
}

#[async_trait]
impl EditableDocument for InMemoryDocument {
    async fn insert_at(&self, offset: usize, unit: char) -> DocumentResult<()> {
        self.with_open(|state| {
            let at = byte_index(&state.text, offset)?;
            state.text.insert(at, unit);
            state.edits += 1;
            Ok(())
        })
    }

    async fn delete_range(&self, start: usize, end: usize) -> DocumentResult<()> {
        self.with_open(|state| {
            if start > end {
                return Err(DocumentError::Rejected(format!(
                    "inverted range {start}..{end}"
                )));
            }
            let from = byte_index(&state.text, start)?;
            let to = byte_index(&state.text, end)?;
            state.text.replace_range(from..to, "");
            state.edits += 1;
            Ok(())
        })
    }

    async fn text(&self) -> DocumentResult<String> {
        self.with_open(|state| Ok(state.text.clone()))
    }

    async fn replace_all(&self, text: &str) -> DocumentResult<()> {
        self.with_open(|state| {
            state.text = text.to_string();
            state.edits += 1;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_delete_by_char_offset() {
        let doc = InMemoryDocument::new("héllo");
        doc.insert_at(2, 'X').await.unwrap();
        assert_eq!(doc.snapshot(), "héXllo");

        doc.delete_range(1, 3).await.unwrap();
        assert_eq!(doc.snapshot(), "hllo");
        assert_eq!(doc.edit_count(), 2);
    }

    #[tokio::test]
    async fn insert_at_end_is_allowed() {
        let doc = InMemoryDocument::new("ab");
        doc.insert_at(2, 'c').await.unwrap();
        assert_eq!(doc.text().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn out_of_range_offset_rejected() {
        let doc = InMemoryDocument::new("ab");
        let err = doc.insert_at(5, 'c').await.unwrap_err();
        assert_eq!(err, DocumentError::OutOfRange { offset: 5, len: 2 });
        assert_eq!(doc.snapshot(), "ab");
    }

    #[tokio::test]
    async fn inverted_range_rejected() {
        let doc = InMemoryDocument::new("abc");
        assert!(matches!(
            doc.delete_range(2, 1).await,
            Err(DocumentError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn closed_document_refuses_everything() {
        let doc = InMemoryDocument::new("abc");
        doc.close();
        assert_eq!(doc.text().await, Err(DocumentError::Closed));
        assert_eq!(doc.replace_all("x").await, Err(DocumentError::Closed));
        assert_eq!(doc.snapshot(), "abc");
    }
}
