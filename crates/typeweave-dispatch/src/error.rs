//! Error types for the dispatcher.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Terminal failure of one dispatch.
///
/// Nothing is retried: every variant reaches the caller of
/// [`Dispatcher::dispatch`](crate::Dispatcher::dispatch) unchanged.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Building, extracting or persisting failed in the calling context.
    ///
    /// Inline failures and sink failures pass through without wrapping.
    #[error(transparent)]
    Extraction(#[from] typeweave_core::Error),

    /// The worker process could not be started.
    #[error("Failed to spawn extraction worker {program}: {source}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker reported a failure of its own (bad input, parse error, ...).
    ///
    /// This is the user-actionable case, as opposed to [`Self::UnexpectedExit`].
    #[error("Extraction worker failed: {cause}")]
    Worker {
        /// Error message reported by the worker.
        cause: String,
    },

    /// The worker exited without reporting a result or an error.
    #[error("Extraction worker exited unexpectedly ({})", describe_exit(.code))]
    UnexpectedExit {
        /// Exit code, `None` if killed by a signal or unknown.
        code: Option<i32>,
    },

    /// No result arrived within the configured bound.
    #[error("Extraction worker did not finish within {timeout:?}")]
    TimedOut { timeout: Duration },

    /// The worker input could not be encoded.
    #[error("Failed to encode worker input: {0}")]
    Encode(#[source] serde_json::Error),

    /// `dispatch_and_persist` was called on a dispatcher built without a sink.
    #[error("No result sink configured")]
    SinkNotConfigured,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl DispatchError {
    /// True for failures the worker reported deliberately.
    pub fn is_worker_reported(&self) -> bool {
        matches!(self, DispatchError::Worker { .. })
    }
}
