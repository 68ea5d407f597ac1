//! Input validation and security checks.

use crate::error::{Error, Result};
use std::path::{Component, Path};

/// Validates that path is within project root (prevents path traversal)
///
/// Both paths must exist; symlinks are resolved before comparing.
pub fn validate_path(path: &Path, project_root: &Path) -> Result<()> {
    let canonical_path = path.canonicalize().map_err(|e| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: format!("Cannot canonicalize: {}", e),
    })?;

    let canonical_root = project_root.canonicalize().map_err(|e| {
        Error::InvalidPath {
            path: project_root.to_path_buf(),
            reason: format!("Cannot canonicalize project root: {}", e),
        }
    })?;

    if !canonical_path.starts_with(&canonical_root) {
        return Err(Error::PathTraversal {
            attempted_path: path.to_path_buf(),
            project_root: project_root.to_path_buf(),
        });
    }

    Ok(())
}

/// Syntactic check that a relative path never climbs above `project_root`.
///
/// Unlike [`validate_path`] this does not touch the filesystem, so it can run
/// on descriptors whose files have not been created yet.
pub fn validate_relative_path(path: &Path, project_root: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "empty path".to_string(),
        });
    }

    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "must be relative to the project root".to_string(),
                });
            }
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth.checked_sub(1).ok_or_else(|| Error::PathTraversal {
                    attempted_path: path.to_path_buf(),
                    project_root: project_root.to_path_buf(),
                })?;
            }
            Component::Normal(_) => depth += 1,
        }
    }

    Ok(())
}
