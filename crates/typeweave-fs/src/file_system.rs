//! FileSystem trait for root-scoped filesystem operations.

use std::io;
use std::path::{Component, Path, PathBuf};

/// File metadata compatible across backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileMetadata {
    /// Whether the path exists.
    pub exists: bool,
    /// Whether the path is a file (false if directory or doesn't exist).
    pub is_file: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// File size in bytes (0 for directories or non-existent files).
    pub size: u64,
}

/// Root-scoped async filesystem.
///
/// Every path handed to an implementation is validated against
/// [`FileSystem::project_root`]; escaping it yields
/// `io::ErrorKind::PermissionDenied`.
///
/// # Design Decisions
///
/// ## Async vs Sync
///
/// All methods are async:
/// - **Native**: I/O operations offloaded to blocking thread pool via tokio::spawn_blocking
/// - **Memory**: operations on a locked map that complete immediately
///
/// ## Error Handling
///
/// Uses `std::io::Result<T>` so callers can wrap failures in their own error
/// types with the path attached.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if file doesn't exist.
    /// Returns `io::ErrorKind::InvalidData` if file is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Get file/directory metadata.
    ///
    /// Returns metadata even if the file doesn't exist (exists=false).
    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Write string contents to a file, replacing it.
    ///
    /// Parent directories are NOT created automatically.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Remove a file.
    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Rename a file, replacing the destination.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a directory and all parent directories.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Get the project root this filesystem is scoped to.
    fn project_root(&self) -> &Path;

    /// Write through a sibling temp file and rename it over `path`.
    ///
    /// Readers never observe a partially written file. The temp file is
    /// removed if the rename fails.
    async fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        let temp_path = temp_path_for(path);
        self.write(&temp_path, contents).await?;

        if let Err(e) = self.rename(&temp_path, path).await {
            let _ = self.remove_file(&temp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

/// `out/types.rs` -> `out/types.rs.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Syntactic normalization: drops `.`, folds `..` into its parent.
///
/// Returns `PermissionDenied` when `..` would climb past the first component.
pub(crate) fn normalize_lexically(path: &Path) -> io::Result<PathBuf> {
    let mut out = PathBuf::new();
    let mut normal_parts = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                out.push(component.as_os_str());
                normal_parts = 0;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if normal_parts == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("Path escapes its root: {}", path.display()),
                    ));
                }
                out.pop();
                normal_parts -= 1;
            }
            Component::Normal(name) => {
                out.push(name);
                normal_parts += 1;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_keeps_extension() {
        assert_eq!(
            temp_path_for(Path::new("out/types.rs")),
            PathBuf::from("out/types.rs.tmp")
        );
        assert_eq!(
            temp_path_for(Path::new("typeweave.toml")),
            PathBuf::from("typeweave.toml.tmp")
        );
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/project/./a/../b")).unwrap(),
            PathBuf::from("/project/b")
        );
        assert_eq!(
            normalize_lexically(Path::new("a/b/..")).unwrap(),
            PathBuf::from("a")
        );

        let err = normalize_lexically(Path::new("/..")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
