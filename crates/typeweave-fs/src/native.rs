//! Native filesystem implementation using std::fs + tokio.

use crate::file_system::normalize_lexically;
use crate::{FileMetadata, FileSystem};
use std::io;
use std::path::{Path, PathBuf};
use tokio::task;

/// Native filesystem implementation using std::fs + tokio.
///
/// This implementation wraps blocking std::fs calls with tokio::spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a new native filesystem scoped to a project root.
    ///
    /// The root itself may not exist yet (e.g. `typeweave config init` in a
    /// fresh directory) as long as its parent does.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the root nor its parent can be canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = project_root.as_ref();
        let project_root = match root.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => {
                let (Some(parent), Some(name)) = (root.parent(), root.file_name()) else {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Project root does not exist: {}", root.display()),
                    ));
                };
                let parent = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
                parent.canonicalize()?.join(name)
            }
        };

        Ok(Self { project_root })
    }

    /// Resolve `path` against the root and reject anything outside it.
    ///
    /// # Security
    ///
    /// Existing paths are canonicalized so symlinks pointing out of the root
    /// are caught; paths that don't exist yet are resolved through their
    /// nearest existing ancestor.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let lexical = normalize_lexically(&absolute)?;

        let resolved = match lexical.canonicalize() {
            Ok(canonical) => canonical,
            Err(_) => resolve_through_ancestor(&lexical),
        };

        if !resolved.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside project root {}",
                    resolved.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(resolved)
    }
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest.
fn resolve_through_ancestor(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();

    while !existing.exists() {
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }

    let mut resolved = existing.canonicalize().unwrap_or(existing);
    for name in missing.into_iter().rev() {
        resolved.push(name);
    }
    resolved
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = self.validate_path(path)?;
        blocking(move || Ok(validated.exists())).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        blocking(move || std::fs::read_to_string(&validated)).await
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let validated = self.validate_path(path)?;
        blocking(move || match std::fs::metadata(&validated) {
            Ok(meta) => Ok(FileMetadata {
                exists: true,
                is_file: meta.is_file(),
                is_dir: meta.is_dir(),
                size: meta.len(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileMetadata::default()),
            Err(e) => Err(e),
        })
        .await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        let contents = contents.to_string();
        blocking(move || std::fs::write(&validated, contents)).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        blocking(move || std::fs::remove_file(&validated)).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_validated = self.validate_path(from)?;
        let to_validated = self.validate_path(to)?;
        blocking(move || std::fs::rename(&from_validated, &to_validated)).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        blocking(move || std::fs::create_dir_all(&validated)).await
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
