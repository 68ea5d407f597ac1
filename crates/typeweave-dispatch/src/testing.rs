//! Test doubles for the dispatcher's collaborators and channel.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use async_trait::async_trait;
use tokio::sync::mpsc;
use typeweave_core::{
    Error, ExtractedType, ExtractionResult, Extractor, LayoutDescriptor, ModelBuilder, ResultSink,
};

use crate::channel::{ChannelEvent, ContextHandle, ContextSpawner, SpawnedContext};
use crate::error::{DispatchError, Result};
use crate::protocol::WorkerInput;

/// Model builder that records the thread of every call.
///
/// The model is the layout itself; a module named `broken.schema` fails.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingBuilder {
    calls: Arc<Mutex<Vec<ThreadId>>>,
}

impl RecordingBuilder {
    pub(crate) fn calls(&self) -> Vec<ThreadId> {
        self.calls.lock().unwrap().clone()
    }
}

impl ModelBuilder for RecordingBuilder {
    type Model = LayoutDescriptor;

    fn build(&self, layout: &LayoutDescriptor) -> typeweave_core::Result<LayoutDescriptor> {
        self.calls.lock().unwrap().push(std::thread::current().id());
        if let Some(module) = layout
            .modules
            .iter()
            .find(|m| m.file_name().is_some_and(|n| n == "broken.schema"))
        {
            return Err(Error::Parse {
                module: module.clone(),
                line: 1,
                message: "parse failure".to_string(),
            });
        }
        Ok(layout.clone())
    }
}

/// Extracts one object type per module, named after the module's file stem.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StemExtractor;

impl Extractor<LayoutDescriptor> for StemExtractor {
    fn extract(&self, model: &LayoutDescriptor) -> typeweave_core::Result<ExtractionResult> {
        Ok(ExtractionResult::new(
            model
                .modules
                .iter()
                .filter_map(|m| m.file_stem())
                .map(|stem| ExtractedType::named(stem.to_string_lossy()))
                .collect(),
        ))
    }
}

/// Sink that keeps results in memory or fails with a fixed message.
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    failure: Option<String>,
    persisted: Mutex<Vec<ExtractionResult>>,
}

impl MemorySink {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            persisted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn persisted(&self) -> Vec<ExtractionResult> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn persist(&self, result: &ExtractionResult) -> typeweave_core::Result<()> {
        if let Some(message) = &self.failure {
            return Err(Error::Persistence {
                path: PathBuf::from("src/generated/types.rs"),
                source: io::Error::other(message.clone()),
            });
        }
        self.persisted.lock().unwrap().push(result.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandleAction {
    Detached,
    Terminated,
}

/// Spawner that replays a fixed event script for every context.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSpawner {
    script: Vec<ChannelEvent>,
    hold_open: bool,
    fail: bool,
    inputs: Mutex<Vec<WorkerInput>>,
    actions: Arc<Mutex<Vec<HandleAction>>>,
}

impl ScriptedSpawner {
    pub(crate) fn new(script: Vec<ChannelEvent>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Keep the event stream open after the script runs out.
    pub(crate) fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub(crate) fn inputs(&self) -> Vec<WorkerInput> {
        self.inputs.lock().unwrap().clone()
    }

    pub(crate) fn actions(&self) -> Vec<HandleAction> {
        self.actions.lock().unwrap().clone()
    }
}

impl ContextSpawner for ScriptedSpawner {
    fn spawn(&self, input: &WorkerInput) -> Result<SpawnedContext> {
        if self.fail {
            return Err(DispatchError::SpawnFailed {
                program: PathBuf::from("scripted-worker"),
                source: io::Error::new(io::ErrorKind::NotFound, "no such worker"),
            });
        }
        self.inputs.lock().unwrap().push(input.clone());

        let (tx, rx) = mpsc::channel(self.script.len() + 1);
        for event in &self.script {
            tx.try_send(event.clone())
                .expect("scripted channel has room for every event");
        }

        Ok(SpawnedContext {
            events: rx,
            handle: Box::new(ScriptedHandle {
                actions: self.actions.clone(),
                open: self.hold_open.then_some(tx),
                consumed: false,
            }),
        })
    }
}

struct ScriptedHandle {
    actions: Arc<Mutex<Vec<HandleAction>>>,
    open: Option<mpsc::Sender<ChannelEvent>>,
    consumed: bool,
}

impl ScriptedHandle {
    fn record(mut self: Box<Self>, action: HandleAction) {
        self.consumed = true;
        self.actions.lock().unwrap().push(action);
    }
}

impl ContextHandle for ScriptedHandle {
    fn detach(self: Box<Self>) {
        self.record(HandleAction::Detached);
    }

    fn terminate(self: Box<Self>) {
        self.record(HandleAction::Terminated);
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.open.take();
        if !self.consumed {
            self.actions.lock().unwrap().push(HandleAction::Terminated);
        }
    }
}
