//! Result sink that writes the generated Rust module to disk.

use crate::codegen::render_module;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use typeweave_core::{Error, ExtractionResult, Result, ResultSink};
use typeweave_fs::FileSystem;

/// Writes extraction results as a generated Rust module.
///
/// The write goes through a temp file and a rename, so a failed or
/// interrupted persist never leaves a truncated module behind.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use typeweave_core::{ExtractionResult, ResultSink};
/// use typeweave_fs::NativeFileSystem;
/// use typeweave_schema::RustModuleSink;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = Arc::new(NativeFileSystem::new(".")?);
/// let sink = RustModuleSink::new(fs, "src/generated/types.rs");
/// sink.persist(&ExtractionResult::default()).await?;
/// # Ok(())
/// # }
/// ```
pub struct RustModuleSink<F: FileSystem> {
    fs: Arc<F>,
    output: PathBuf,
}

impl<F: FileSystem> std::fmt::Debug for RustModuleSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustModuleSink")
            .field("fs", &"FileSystem")
            .field("output", &self.output)
            .finish()
    }
}

impl<F: FileSystem> RustModuleSink<F> {
    /// Creates a sink writing to `output` (relative paths resolve against
    /// the filesystem's project root).
    pub fn new(fs: Arc<F>, output: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn persistence_error(&self, source: std::io::Error) -> Error {
        Error::Persistence {
            path: self.output.clone(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl<F: FileSystem> ResultSink for RustModuleSink<F> {
    async fn persist(&self, result: &ExtractionResult) -> Result<()> {
        let source = render_module(result);

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs
                .create_dir_all(parent)
                .await
                .map_err(|e| self.persistence_error(e))?;
        }

        self.fs
            .write_atomic(&self.output, &source)
            .await
            .map_err(|e| self.persistence_error(e))?;

        tracing::debug!(
            output = %self.output.display(),
            types = result.len(),
            bytes = source.len(),
            "persisted generated module"
        );
        Ok(())
    }
}
