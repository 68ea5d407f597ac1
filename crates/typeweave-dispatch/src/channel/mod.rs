//! Background execution channel.
//!
//! One dispatch gets one freshly spawned context. The context reports
//! through an ordered stream of [`ChannelEvent`]s; an [`OutcomeLatch`]
//! reduces that stream to exactly one [`ExecutionOutcome`], bounded by a
//! timeout so a silent worker can never hang the caller.

mod latch;
mod process;

pub use latch::OutcomeLatch;
pub use process::ProcessSpawner;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use typeweave_core::{ExtractionResult, LayoutDescriptor};

use crate::error::{DispatchError, Result};
use crate::protocol::WorkerInput;

/// Default upper bound on one background extraction.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Lifecycle signal emitted by a background context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The context started. Trace-only.
    Online,
    /// Extraction finished; carries the deserialized result.
    Message(ExtractionResult),
    /// The context reported a failure.
    Error(String),
    /// The context exited with the given code (`None` if killed by a signal).
    Exited(Option<i32>),
}

impl ChannelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelEvent::Online => "online",
            ChannelEvent::Message(_) => "message",
            ChannelEvent::Error(_) => "error",
            ChannelEvent::Exited(_) => "exited",
        }
    }
}

/// Terminal state of one dispatch.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Success(ExtractionResult),
    Failure(DispatchError),
}

impl ExecutionOutcome {
    pub fn into_result(self) -> Result<ExtractionResult> {
        match self {
            ExecutionOutcome::Success(result) => Ok(result),
            ExecutionOutcome::Failure(err) => Err(err),
        }
    }
}

/// Control over a spawned context, consumed by exactly one of its methods.
///
/// Dropping a handle without calling either method terminates the context.
pub trait ContextHandle: Send {
    /// Stops tracking the context. It keeps running until it exits on its own.
    fn detach(self: Box<Self>);

    /// Stops the context.
    fn terminate(self: Box<Self>);
}

/// A freshly started context: its event stream plus its handle.
pub struct SpawnedContext {
    pub events: mpsc::Receiver<ChannelEvent>,
    pub handle: Box<dyn ContextHandle>,
}

impl fmt::Debug for SpawnedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedContext").finish_non_exhaustive()
    }
}

/// Starts isolated contexts. Must be called from within a tokio runtime.
pub trait ContextSpawner: Send + Sync + fmt::Debug {
    fn spawn(&self, input: &WorkerInput) -> Result<SpawnedContext>;
}

/// Runs extraction in a fresh background context per call.
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    spawner: Arc<dyn ContextSpawner>,
    timeout: Duration,
}

impl ChannelExecutor {
    pub fn new(spawner: Arc<dyn ContextSpawner>) -> Self {
        Self {
            spawner,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Spawns a context for `layout` and waits for its single outcome.
    ///
    /// On success the context is detached; on any failure it is terminated.
    pub async fn run(&self, layout: &LayoutDescriptor) -> Result<ExtractionResult> {
        let input = WorkerInput {
            layout: layout.clone(),
        };
        let SpawnedContext { mut events, handle } = self.spawner.spawn(&input)?;
        tracing::debug!(modules = layout.modules.len(), "Spawned extraction worker");

        let mut latch = OutcomeLatch::new();
        let waited =
            tokio::time::timeout(self.timeout, wait_for_outcome(&mut latch, &mut events)).await;
        let outcome = match waited {
            Ok(outcome) => outcome,
            Err(_) => latch.time_out(self.timeout),
        }
        .unwrap_or_else(|| {
            ExecutionOutcome::Failure(DispatchError::UnexpectedExit { code: None })
        });

        match outcome {
            ExecutionOutcome::Success(result) => {
                tracing::debug!(types = result.len(), "Extraction worker succeeded, detaching");
                handle.detach();
                Ok(result)
            }
            ExecutionOutcome::Failure(err) => {
                match &err {
                    DispatchError::Worker { cause } => {
                        tracing::warn!(%cause, "Extraction worker reported an error");
                    }
                    other => tracing::error!(error = %other, "Extraction worker failed"),
                }
                handle.terminate();
                Err(err)
            }
        }
    }
}

async fn wait_for_outcome(
    latch: &mut OutcomeLatch,
    events: &mut mpsc::Receiver<ChannelEvent>,
) -> Option<ExecutionOutcome> {
    while let Some(event) = events.recv().await {
        if let Some(outcome) = latch.observe(event) {
            return Some(outcome);
        }
    }
    latch.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{HandleAction, ScriptedSpawner};
    use typeweave_core::ExtractedType;

    fn foo() -> ExtractionResult {
        ExtractionResult::new(vec![ExtractedType::named("Foo")])
    }

    fn layout() -> LayoutDescriptor {
        LayoutDescriptor::new(".").with_module("a.schema")
    }

    #[tokio::test]
    async fn test_message_resolves_and_detaches() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![
            ChannelEvent::Online,
            ChannelEvent::Message(foo()),
            ChannelEvent::Exited(Some(0)),
        ]));
        let executor = ChannelExecutor::new(spawner.clone());

        let result = executor.run(&layout()).await.unwrap();
        assert_eq!(result, foo());
        assert_eq!(spawner.actions(), vec![HandleAction::Detached]);
        assert_eq!(spawner.inputs(), vec![WorkerInput { layout: layout() }]);
    }

    #[tokio::test]
    async fn test_error_rejects_and_terminates() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![
            ChannelEvent::Online,
            ChannelEvent::Error("parse failure".to_string()),
            ChannelEvent::Message(foo()),
        ]));
        let executor = ChannelExecutor::new(spawner.clone());

        let err = executor.run(&layout()).await.unwrap_err();
        assert!(err.to_string().contains("parse failure"));
        assert!(err.is_worker_reported());
        assert_eq!(spawner.actions(), vec![HandleAction::Terminated]);
    }

    #[tokio::test]
    async fn test_exit_without_message() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![
            ChannelEvent::Online,
            ChannelEvent::Exited(Some(2)),
        ]));
        let executor = ChannelExecutor::new(spawner.clone());

        let err = executor.run(&layout()).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnexpectedExit { code: Some(2) }));
    }

    #[tokio::test]
    async fn test_closed_stream_without_exit() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![ChannelEvent::Online]));
        let executor = ChannelExecutor::new(spawner);

        let err = executor.run(&layout()).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnexpectedExit { code: None }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_worker_times_out() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![ChannelEvent::Online]).hold_open());
        let executor =
            ChannelExecutor::new(spawner.clone()).with_timeout(Duration::from_secs(5));

        let err = executor.run(&layout()).await.unwrap_err();
        assert!(matches!(err, DispatchError::TimedOut { timeout } if timeout == Duration::from_secs(5)));
        assert_eq!(spawner.actions(), vec![HandleAction::Terminated]);
    }

    #[tokio::test]
    async fn test_spawn_failure_surfaces() {
        let spawner = Arc::new(ScriptedSpawner::failing());
        let executor = ChannelExecutor::new(spawner.clone());

        let err = executor.run(&layout()).await.unwrap_err();
        assert!(matches!(err, DispatchError::SpawnFailed { .. }));
        assert!(spawner.actions().is_empty());
    }

    #[test]
    fn test_default_timeout() {
        let executor = ChannelExecutor::new(Arc::new(ScriptedSpawner::new(vec![])));
        assert_eq!(executor.timeout(), Duration::from_secs(600));
    }
}
