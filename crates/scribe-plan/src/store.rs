//! Workspace file persistence.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{FileStoreError, FileStoreResult};

/// Text file storage rooted at a workspace.
///
/// Paths are workspace-relative and `/`-separated. Every implementation
/// normalizes them with [`normalize_path`], so `./src//lib.rs` and
/// `src/lib.rs` name the same file and nothing can escape the root.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Read a file. Returns `Ok(None)` if it does not exist.
    async fn read(&self, path: &str) -> FileStoreResult<Option<String>>;

    /// Write a file, creating missing parent directories.
    async fn write(&self, path: &str, content: &str) -> FileStoreResult<()>;

    /// Remove a file. Returns `true` if it existed.
    async fn remove(&self, path: &str) -> FileStoreResult<bool>;

    async fn exists(&self, path: &str) -> FileStoreResult<bool> {
        Ok(self.read(path).await?.is_some())
    }
}

/// Normalize a workspace-relative path.
///
/// Backslashes become `/`, empty and `.` components are dropped. Absolute
/// paths, drive prefixes and `..` components are rejected.
pub fn normalize_path(path: &str) -> FileStoreResult<String> {
    let invalid = |reason: &str| FileStoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let unified = path.trim().replace('\\', "/");
    if unified.starts_with('/') {
        return Err(invalid("absolute paths are not allowed"));
    }
    if unified.split('/').next().is_some_and(|first| first.ends_with(':')) {
        return Err(invalid("drive prefixes are not allowed"));
    }

    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(invalid("parent directory components are not allowed")),
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(parts.join("/"))
}

// ---------------------------------------------------------------------------
// InMemoryFileStore
// ---------------------------------------------------------------------------

/// `BTreeMap`-backed store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    files: RwLock<BTreeMap<String, String>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with files. Invalid paths are an error.
    pub fn with_files<I, K, V>(files: I) -> FileStoreResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (path, content) in files {
            map.insert(normalize_path(path.as_ref())?, content.into());
        }
        Ok(Self {
            files: RwLock::new(map),
        })
    }

    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().expect("lock poisoned").is_empty()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Synchronous lookup, mainly for assertions.
    pub fn get(&self, path: &str) -> Option<String> {
        let key = normalize_path(path).ok()?;
        self.files.read().expect("lock poisoned").get(&key).cloned()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn read(&self, path: &str) -> FileStoreResult<Option<String>> {
        let key = normalize_path(path)?;
        Ok(self.files.read().expect("lock poisoned").get(&key).cloned())
    }

    async fn write(&self, path: &str, content: &str) -> FileStoreResult<()> {
        let key = normalize_path(path)?;
        self.files
            .write()
            .expect("lock poisoned")
            .insert(key, content.to_string());
        Ok(())
    }

    async fn remove(&self, path: &str) -> FileStoreResult<bool> {
        let key = normalize_path(path)?;
        Ok(self.files.write().expect("lock poisoned").remove(&key).is_some())
    }
}

// ---------------------------------------------------------------------------
// LocalFileStore
// ---------------------------------------------------------------------------

/// Store backed by a directory on disk.
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a workspace-relative path.
    pub fn resolve(&self, path: &str) -> FileStoreResult<PathBuf> {
        let normalized = normalize_path(path)?;
        Ok(self.root.join(normalized))
    }
}

fn io_error(path: &str, source: std::io::Error) -> FileStoreError {
    FileStoreError::Io {
        path: path.to_string(),
        source,
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read(&self, path: &str) -> FileStoreResult<Option<String>> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                Err(FileStoreError::NotUtf8(path.to_string()))
            }
            Err(e) => Err(io_error(path, e)),
        }
    }

    async fn write(&self, path: &str, content: &str) -> FileStoreResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn remove(&self, path: &str) -> FileStoreResult<bool> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cleans_separators() {
        assert_eq!(normalize_path("./src//lib.rs").unwrap(), "src/lib.rs");
        assert_eq!(normalize_path("src\\main.rs").unwrap(), "src/main.rs");
        assert_eq!(normalize_path(" README.md ").unwrap(), "README.md");
    }

    #[test]
    fn normalize_rejects_escapes() {
        for bad in ["", ".", "/etc/passwd", "../secret", "a/../../b", "C:/windows", "\\\\server"] {
            assert!(
                matches!(normalize_path(bad), Err(FileStoreError::InvalidPath { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[tokio::test]
    async fn in_memory_read_write_remove() {
        let store = InMemoryFileStore::new();
        assert_eq!(store.read("a.txt").await.unwrap(), None);

        store.write("dir/a.txt", "hello").await.unwrap();
        assert_eq!(store.read("./dir/a.txt").await.unwrap().as_deref(), Some("hello"));
        assert!(store.exists("dir/a.txt").await.unwrap());

        assert!(store.remove("dir/a.txt").await.unwrap());
        assert!(!store.remove("dir/a.txt").await.unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn in_memory_seeding_normalizes() {
        let store = InMemoryFileStore::with_files([("./b.rs", "b"), ("a.rs", "a")]).unwrap();
        assert_eq!(store.paths(), vec!["a.rs".to_string(), "b.rs".to_string()]);
        assert_eq!(store.get("b.rs").as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn local_store_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.write("nested/deep/file.txt", "content").await.unwrap();
        let on_disk = std::fs::read_to_string(dir.path().join("nested/deep/file.txt")).unwrap();
        assert_eq!(on_disk, "content");
        assert_eq!(
            store.read("nested/deep/file.txt").await.unwrap().as_deref(),
            Some("content")
        );
    }

    #[tokio::test]
    async fn local_store_missing_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        assert_eq!(store.read("missing.txt").await.unwrap(), None);
        assert!(!store.remove("missing.txt").await.unwrap());

        store.write("gone.txt", "x").await.unwrap();
        assert!(store.remove("gone.txt").await.unwrap());
        assert!(!dir.path().join("gone.txt").exists());
    }

    #[tokio::test]
    async fn local_store_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xFF, 0xFE, 0x00]).unwrap();
        let store = LocalFileStore::new(dir.path());
        assert!(matches!(
            store.read("blob.bin").await,
            Err(FileStoreError::NotUtf8(_))
        ));
    }

    #[tokio::test]
    async fn local_store_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        assert!(store.write("../outside.txt", "x").await.is_err());
    }
}
