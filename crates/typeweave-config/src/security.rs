use std::path::{Path, PathBuf};
use thiserror::Error;
use typeweave_core::validation::validate_relative_path;

use crate::types::{ProjectConfig, CONFIG_VERSION};

/// Security-related errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Invalid module path {path}: {reason}")]
    InvalidModulePath { path: PathBuf, reason: String },

    #[error("Invalid layout root {path}: {reason}")]
    InvalidLayoutRoot { path: PathBuf, reason: String },

    #[error("Invalid output path {path}: {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    #[error("Dispatch timeout must be at least one second")]
    ZeroTimeout,

    #[error("Unsupported config version {found} (expected {expected})")]
    UnsupportedVersion { found: String, expected: String },
}

/// Validate a schema module path
///
/// Module paths must be relative to the layout root and must not climb
/// out of it.
pub fn validate_module_path(module: &Path, root: &Path) -> Result<(), SecurityError> {
    validate_relative_path(module, root).map_err(|e| SecurityError::InvalidModulePath {
        path: module.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Validate the layout root
///
/// The root is resolved against the config directory, so it must be
/// relative and stay inside it.
pub fn validate_layout_root(root: &Path) -> Result<(), SecurityError> {
    validate_project_relative(root).map_err(|reason| SecurityError::InvalidLayoutRoot {
        path: root.to_path_buf(),
        reason,
    })
}

/// Validate the generated module path
///
/// Output paths must:
/// - Be relative to the config directory
/// - Not escape it
/// - Name a `.rs` file
pub fn validate_output_path(path: &Path) -> Result<(), SecurityError> {
    let invalid = |reason: String| SecurityError::InvalidOutputPath {
        path: path.to_path_buf(),
        reason,
    };

    validate_project_relative(path).map_err(invalid)?;

    if path.extension().and_then(|e| e.to_str()) != Some("rs") {
        return Err(invalid("must be a .rs file".to_string()));
    }

    Ok(())
}

pub fn validate_timeout(timeout_secs: u64) -> Result<(), SecurityError> {
    if timeout_secs == 0 {
        return Err(SecurityError::ZeroTimeout);
    }
    Ok(())
}

/// Only major version 1 is understood.
pub fn validate_version(version: &str) -> Result<(), SecurityError> {
    if version.split('.').next() != Some("1") {
        return Err(SecurityError::UnsupportedVersion {
            found: version.to_string(),
            expected: CONFIG_VERSION.to_string(),
        });
    }
    Ok(())
}

/// Run every check over a loaded config.
pub fn validate_config(config: &ProjectConfig) -> Result<(), SecurityError> {
    validate_version(&config.version)?;
    validate_layout_root(&config.layout.root)?;
    for module in &config.layout.modules {
        validate_module_path(module, &config.layout.root)?;
    }
    validate_timeout(config.dispatch.timeout_secs)?;
    validate_output_path(&config.output.path)?;
    Ok(())
}

fn validate_project_relative(path: &Path) -> Result<(), String> {
    validate_relative_path(path, Path::new(".")).map_err(|e| e.to_string())
}
