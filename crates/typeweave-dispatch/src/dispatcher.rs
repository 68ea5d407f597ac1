//! The dispatcher: picks an executor per dispatch and returns its outcome.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use typeweave_core::{ExtractionResult, Extractor, LayoutDescriptor, ModelBuilder, ResultSink};

use crate::channel::{ChannelExecutor, ContextSpawner, ProcessSpawner, DEFAULT_TIMEOUT};
use crate::error::{DispatchError, Result};
use crate::executor::{ExecutionMode, Executor, InlineExecutor};
use crate::probe::{CapabilityProbe, StaticProbe, WorkerBinaryProbe, WorkerCommand};

/// Runs extraction in a background worker when one is available and inline
/// otherwise.
///
/// The choice is made once at the start of every [`dispatch`](Self::dispatch)
/// and never revised mid-flight. Either way the caller gets exactly one
/// result or one error.
///
/// # Example
///
/// ```no_run
/// use typeweave_core::LayoutDescriptor;
/// use typeweave_dispatch::{Dispatcher, WorkerCommand, WORKER_SUBCOMMAND};
/// use typeweave_schema::{SchemaModelBuilder, TypeExtractor};
///
/// # async fn run() -> typeweave_dispatch::Result<()> {
/// let dispatcher = Dispatcher::builder(SchemaModelBuilder::new(), TypeExtractor::new())
///     .worker_command(WorkerCommand::new("/usr/local/bin/typeweave").arg(WORKER_SUBCOMMAND))
///     .build();
/// let layout = LayoutDescriptor::new(".").with_module("schema/user.schema");
/// let result = dispatcher.dispatch(&layout).await?;
/// println!("{} types via {}", result.len(), dispatcher.mode());
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<B, X> {
    probe: Box<dyn CapabilityProbe>,
    inline: InlineExecutor<B, X>,
    channel: Option<ChannelExecutor>,
    sink: Option<Arc<dyn ResultSink>>,
}

impl<B, X> Dispatcher<B, X>
where
    B: ModelBuilder,
    X: Extractor<B::Model>,
{
    pub fn builder(builder: B, extractor: X) -> DispatcherBuilder<B, X> {
        DispatcherBuilder::new(builder, extractor)
    }

    /// The mode the next dispatch would run in.
    pub fn mode(&self) -> ExecutionMode {
        self.select().mode()
    }

    /// Extracts types for `layout`.
    ///
    /// In inline mode this blocks the calling thread until extraction
    /// finishes. Nothing is retried.
    pub async fn dispatch(&self, layout: &LayoutDescriptor) -> Result<ExtractionResult> {
        let executor = self.select();
        tracing::debug!(mode = %executor.mode(), modules = layout.modules.len(), "Dispatching extraction");

        let result = executor.execute(layout).await?;
        tracing::debug!(types = result.len(), "Extraction finished");
        Ok(result)
    }

    /// Extracts from an already built model, then persists through the sink.
    ///
    /// Returns only after the sink has completed. A sink failure fails the
    /// whole call even though extraction succeeded.
    pub async fn dispatch_and_persist(&self, model: &B::Model) -> Result<ExtractionResult> {
        let sink = self.sink.as_ref().ok_or(DispatchError::SinkNotConfigured)?;

        let result = self.inline.extractor().extract(model)?;
        sink.persist(&result).await?;
        tracing::debug!(types = result.len(), "Extraction persisted");
        Ok(result)
    }

    fn select(&self) -> &dyn Executor {
        match &self.channel {
            Some(channel) if self.probe.is_available() => channel,
            _ => &self.inline,
        }
    }
}

impl<B, X> fmt::Debug for Dispatcher<B, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("probe", &self.probe)
            .field("channel", &self.channel)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
///
/// Background execution is opt-in: without a [`worker_command`](Self::worker_command)
/// or [`spawner`](Self::spawner) every dispatch runs inline, whatever the probe
/// says. Only a binary that serves the worker protocol can be a worker, so the
/// running executable is never assumed to be one.
pub struct DispatcherBuilder<B, X> {
    builder: B,
    extractor: X,
    probe: Option<Box<dyn CapabilityProbe>>,
    spawner: Option<Arc<dyn ContextSpawner>>,
    timeout: Duration,
    sink: Option<Arc<dyn ResultSink>>,
}

impl<B, X> DispatcherBuilder<B, X>
where
    B: ModelBuilder,
    X: Extractor<B::Model>,
{
    pub fn new(builder: B, extractor: X) -> Self {
        Self {
            builder,
            extractor,
            probe: None,
            spawner: None,
            timeout: DEFAULT_TIMEOUT,
            sink: None,
        }
    }

    /// Override the capability probe.
    pub fn probe(mut self, probe: impl CapabilityProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Override how background contexts are started.
    pub fn spawner(mut self, spawner: Arc<dyn ContextSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Use `command` as the worker, probing for its program.
    pub fn worker_command(mut self, command: WorkerCommand) -> Self {
        if self.probe.is_none() {
            self.probe = Some(Box::new(WorkerBinaryProbe::new(command.clone())));
        }
        self.spawner = Some(Arc::new(ProcessSpawner::new(command)));
        self
    }

    /// Bound on one background extraction (default 600 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Dispatcher<B, X> {
        let spawner = self.spawner;
        let probe = self.probe.unwrap_or_else(|| {
            let probe = if spawner.is_some() {
                StaticProbe::available()
            } else {
                StaticProbe::unavailable()
            };
            Box::new(probe) as Box<dyn CapabilityProbe>
        });
        if spawner.is_none() {
            tracing::debug!("No worker configured, dispatching inline");
        }

        Dispatcher {
            probe,
            inline: InlineExecutor::new(self.builder, self.extractor),
            channel: spawner.map(|spawner| ChannelExecutor::new(spawner).with_timeout(self.timeout)),
            sink: self.sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelEvent;
    use crate::testing::{MemorySink, RecordingBuilder, ScriptedSpawner, StemExtractor};
    use serde_json::json;
    use typeweave_core::ExtractedType;

    fn dispatcher(
        capable: bool,
        spawner: Arc<ScriptedSpawner>,
    ) -> (Dispatcher<RecordingBuilder, StemExtractor>, RecordingBuilder) {
        let builder = RecordingBuilder::default();
        let probe = if capable {
            StaticProbe::available()
        } else {
            StaticProbe::unavailable()
        };
        let dispatcher = Dispatcher::builder(builder.clone(), StemExtractor)
            .probe(probe)
            .spawner(spawner)
            .build();
        (dispatcher, builder)
    }

    fn foo() -> ExtractionResult {
        serde_json::from_value(json!({ "types": [{ "name": "Foo" }] })).unwrap()
    }

    #[tokio::test]
    async fn test_empty_layout_inline() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![]));
        let (dispatcher, _) = dispatcher(false, spawner.clone());
        assert_eq!(dispatcher.mode(), ExecutionMode::Inline);

        let layout: LayoutDescriptor = serde_json::from_value(json!({ "modules": [] })).unwrap();
        let result = dispatcher.dispatch(&layout).await.unwrap();

        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "types": [] }));
        assert!(spawner.inputs().is_empty());
    }

    #[tokio::test]
    async fn test_inline_runs_on_caller_thread() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![]));
        let (dispatcher, builder) = dispatcher(false, spawner.clone());

        let layout = LayoutDescriptor::new(".").with_module("a.schema");
        let result = dispatcher.dispatch(&layout).await.unwrap();

        assert_eq!(result.types, vec![ExtractedType::named("a")]);
        assert_eq!(builder.calls(), vec![std::thread::current().id()]);
        assert!(spawner.inputs().is_empty());
    }

    #[tokio::test]
    async fn test_background_message() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![
            ChannelEvent::Online,
            ChannelEvent::Message(foo()),
            ChannelEvent::Exited(Some(0)),
        ]));
        let (dispatcher, builder) = dispatcher(true, spawner.clone());
        assert_eq!(dispatcher.mode(), ExecutionMode::Background);

        let layout: LayoutDescriptor =
            serde_json::from_value(json!({ "modules": ["a.schema"] })).unwrap();
        let result = dispatcher.dispatch(&layout).await.unwrap();

        assert_eq!(result, foo());
        assert!(builder.calls().is_empty());
        assert_eq!(spawner.inputs().len(), 1);
        assert_eq!(spawner.inputs()[0].layout, layout);
    }

    #[tokio::test]
    async fn test_background_error() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![
            ChannelEvent::Online,
            ChannelEvent::Error("parse failure".to_string()),
            ChannelEvent::Exited(Some(1)),
        ]));
        let (dispatcher, builder) = dispatcher(true, spawner);

        let err = dispatcher
            .dispatch(&LayoutDescriptor::new(".").with_module("a.schema"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("parse failure"));
        assert!(builder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_inline_failure_propagates() {
        let spawner = Arc::new(ScriptedSpawner::new(vec![]));
        let (dispatcher, _) = dispatcher(false, spawner);

        let err = dispatcher
            .dispatch(&LayoutDescriptor::new(".").with_module("broken.schema"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Extraction(typeweave_core::Error::Parse { .. })));
    }

    #[tokio::test]
    async fn test_dispatch_and_persist() {
        let sink = Arc::new(MemorySink::default());
        let dispatcher = Dispatcher::builder(RecordingBuilder::default(), StemExtractor)
            .probe(StaticProbe::unavailable())
            .sink(sink.clone())
            .build();

        let model = LayoutDescriptor::new(".").with_module("user.schema");
        let result = dispatcher.dispatch_and_persist(&model).await.unwrap();

        assert_eq!(result.types, vec![ExtractedType::named("user")]);
        assert_eq!(sink.persisted(), vec![result]);
    }

    #[tokio::test]
    async fn test_sink_failure_fails_the_call() {
        let dispatcher = Dispatcher::builder(RecordingBuilder::default(), StemExtractor)
            .probe(StaticProbe::unavailable())
            .sink(Arc::new(MemorySink::failing("disk full")))
            .build();

        let model = LayoutDescriptor::new(".").with_module("user.schema");
        let err = dispatcher.dispatch_and_persist(&model).await.unwrap_err();

        assert!(err.to_string().contains("disk full"));
        assert!(matches!(
            err,
            DispatchError::Extraction(typeweave_core::Error::Persistence { .. })
        ));
    }

    #[tokio::test]
    async fn test_persist_without_sink() {
        let dispatcher = Dispatcher::builder(RecordingBuilder::default(), StemExtractor)
            .probe(StaticProbe::unavailable())
            .build();

        let err = dispatcher
            .dispatch_and_persist(&LayoutDescriptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::SinkNotConfigured));
    }

    #[tokio::test]
    async fn test_default_build_runs_inline() {
        let builder = RecordingBuilder::default();
        let dispatcher = Dispatcher::builder(builder.clone(), StemExtractor).build();
        assert_eq!(dispatcher.mode(), ExecutionMode::Inline);

        let layout: LayoutDescriptor =
            serde_json::from_value(json!({ "modules": ["a.schema"] })).unwrap();
        let result = dispatcher.dispatch(&layout).await.unwrap();

        assert_eq!(result.types, vec![ExtractedType::named("a")]);
        assert_eq!(builder.calls(), vec![std::thread::current().id()]);
    }

    #[test]
    fn test_probe_alone_does_not_enable_background() {
        let dispatcher = Dispatcher::builder(RecordingBuilder::default(), StemExtractor)
            .probe(StaticProbe::available())
            .build();
        assert_eq!(dispatcher.mode(), ExecutionMode::Inline);
    }

    #[test]
    fn test_missing_worker_means_inline() {
        let dispatcher = Dispatcher::builder(RecordingBuilder::default(), StemExtractor)
            .worker_command(WorkerCommand::new("/definitely/not/a/worker"))
            .build();
        assert_eq!(dispatcher.mode(), ExecutionMode::Inline);
    }

    #[test]
    fn test_spawner_without_probe_is_available() {
        let dispatcher = Dispatcher::builder(RecordingBuilder::default(), StemExtractor)
            .spawner(Arc::new(ScriptedSpawner::new(vec![])))
            .build();
        assert_eq!(dispatcher.mode(), ExecutionMode::Background);
    }
}
