//! In-memory filesystem implementation.

use crate::file_system::normalize_lexically;
use crate::{FileMetadata, FileSystem};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory filesystem keyed by normalized absolute path.
///
/// Directories are implicit. Clones share the same storage, so a test can
/// hand one clone to the code under test and inspect another.
///
/// Writes can be made to fail with [`MemoryFileSystem::fail_writes`] to
/// exercise persistence error paths.
///
/// # Thread Safety
///
/// Uses `Arc<RwLock<HashMap>>` for interior mutability:
/// - Multiple concurrent readers (common case)
/// - Exclusive writer
#[derive(Clone, Debug)]
pub struct MemoryFileSystem {
    project_root: PathBuf,
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
    write_failure: Arc<RwLock<Option<String>>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem rooted at a virtual path (e.g. "/project").
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let project_root = normalize_lexically(project_root.as_ref())?;
        Ok(Self {
            project_root,
            files: Arc::new(RwLock::new(HashMap::new())),
            write_failure: Arc::new(RwLock::new(None)),
        })
    }

    /// Add a file (used during setup).
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) -> io::Result<()> {
        let normalized = self.validate_path(path.as_ref())?;
        self.files.write().insert(normalized, contents.into());
        Ok(())
    }

    /// Make every subsequent write or rename fail with `message`.
    pub fn fail_writes(&self, message: impl Into<String>) {
        *self.write_failure.write() = Some(message.into());
    }

    /// Snapshot of stored paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn check_writable(&self) -> io::Result<()> {
        match self.write_failure.read().as_ref() {
            Some(message) => Err(io::Error::new(io::ErrorKind::Other, message.clone())),
            None => Ok(()),
        }
    }

    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let normalized = normalize_lexically(&absolute)?;

        if !normalized.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside {}",
                    normalized.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(normalized)
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let normalized = self.validate_path(path)?;
        Ok(self.files.read().contains_key(&normalized))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let normalized = self.validate_path(path)?;
        self.files.read().get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", normalized.display()),
            )
        })
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let normalized = self.validate_path(path)?;
        let files = self.files.read();

        if let Some(contents) = files.get(&normalized) {
            return Ok(FileMetadata {
                exists: true,
                is_file: true,
                is_dir: false,
                size: contents.len() as u64,
            });
        }

        let is_dir = normalized == self.project_root
            || files.keys().any(|p| p.starts_with(&normalized));
        Ok(FileMetadata {
            exists: is_dir,
            is_file: false,
            is_dir,
            size: 0,
        })
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let normalized = self.validate_path(path)?;
        self.check_writable()?;
        self.files.write().insert(normalized, contents.to_string());
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let normalized = self.validate_path(path)?;
        self.files
            .write()
            .remove(&normalized)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_normalized = self.validate_path(from)?;
        let to_normalized = self.validate_path(to)?;
        self.check_writable()?;

        let mut files = self.files.write();
        let contents = files
            .remove(&from_normalized)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Source file not found"))?;
        files.insert(to_normalized, contents);
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        // Directories are implicit
        self.validate_path(path).map(|_| ())
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp_file() {
        let fs = MemoryFileSystem::new("/project").unwrap();
        fs.write_atomic(Path::new("out/types.rs"), "// generated")
            .await
            .unwrap();

        assert_eq!(fs.paths(), vec![PathBuf::from("/project/out/types.rs")]);
        assert_eq!(
            fs.read_to_string(Path::new("/project/out/types.rs"))
                .await
                .unwrap(),
            "// generated"
        );
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let fs = MemoryFileSystem::new("/project").unwrap();
        fs.fail_writes("disk full");

        let err = fs
            .write_atomic(Path::new("types.rs"), "x")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(fs.paths().is_empty());
    }

    #[tokio::test]
    async fn test_directories_are_implicit() {
        let fs = MemoryFileSystem::new("/project").unwrap();
        fs.add_file("schema/user.schema", "type User {}").unwrap();

        let meta = fs.metadata(Path::new("schema")).await.unwrap();
        assert!(meta.is_dir);
        assert!(!meta.is_file);

        let meta = fs.metadata(Path::new("schema/user.schema")).await.unwrap();
        assert!(meta.is_file);
        assert_eq!(meta.size, 12);
    }
}
