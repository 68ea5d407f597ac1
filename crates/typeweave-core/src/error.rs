//! Error types for typeweave core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for typeweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a program model, extracting from it, or
/// persisting the extraction result.
#[derive(Debug, Error)]
pub enum Error {
    /// A module listed in the layout does not exist.
    #[error("Module not found: {path}")]
    ModuleNotFound {
        /// Resolved path of the missing module.
        path: PathBuf,
    },

    /// Syntax error in a schema module.
    #[error("Parse error in {module}:{line}: {message}")]
    Parse {
        /// Module the error was found in, as listed in the layout.
        module: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What the parser expected or found.
        message: String,
    },

    /// A type is declared more than once across the program.
    #[error("Type `{name}` declared in both {first} and {second}")]
    DuplicateType {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A field or variant is declared twice within one type.
    #[error("Type `{owner}` declares `{member}` more than once")]
    DuplicateMember { owner: String, member: String },

    /// A field refers to a type that is neither builtin nor declared.
    #[error("Unknown type `{name}` referenced by `{referenced_by}` in {module}")]
    UnknownType {
        /// The unresolved type name.
        name: String,
        /// `Type.field` that holds the reference.
        referenced_by: String,
        /// Module declaring the referencing type.
        module: PathBuf,
    },

    /// Invalid path in a layout descriptor.
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Path traversal attempt detected
    #[error("Path traversal: {attempted_path:?} outside {project_root:?}")]
    PathTraversal {
        attempted_path: PathBuf,
        project_root: PathBuf,
    },

    /// The generated module could not be written.
    #[error("Failed to write generated module {path}: {source}")]
    Persistence {
        /// Output path of the generated module.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
