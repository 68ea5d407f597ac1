//! Execution strategies behind a single interface.

use std::fmt;

use async_trait::async_trait;
use typeweave_core::{ExtractionResult, Extractor, LayoutDescriptor, ModelBuilder};

use crate::channel::ChannelExecutor;
use crate::error::Result;

/// Where a dispatch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On the caller's thread, blocking it for the whole extraction.
    Inline,
    /// In an isolated background context.
    Background,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Inline => write!(f, "inline"),
            ExecutionMode::Background => write!(f, "background"),
        }
    }
}

/// One way of turning a layout into an extraction result.
#[async_trait]
pub trait Executor: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    async fn execute(&self, layout: &LayoutDescriptor) -> Result<ExtractionResult>;
}

/// Builds the program model and extracts synchronously.
///
/// `execute` never yields: the calling thread is occupied until the
/// extraction returns.
pub struct InlineExecutor<B, X> {
    builder: B,
    extractor: X,
}

impl<B, X> InlineExecutor<B, X>
where
    B: ModelBuilder,
    X: Extractor<B::Model>,
{
    pub fn new(builder: B, extractor: X) -> Self {
        Self { builder, extractor }
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Build then extract, on the current thread.
    pub fn run(&self, layout: &LayoutDescriptor) -> typeweave_core::Result<ExtractionResult> {
        let model = self.builder.build(layout)?;
        self.extractor.extract(&model)
    }
}

impl<B, X> fmt::Debug for InlineExecutor<B, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<B, X> Executor for InlineExecutor<B, X>
where
    B: ModelBuilder,
    X: Extractor<B::Model>,
{
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Inline
    }

    async fn execute(&self, layout: &LayoutDescriptor) -> Result<ExtractionResult> {
        tracing::debug!(modules = layout.modules.len(), "Extracting inline");
        Ok(self.run(layout)?)
    }
}

#[async_trait]
impl Executor for ChannelExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Background
    }

    async fn execute(&self, layout: &LayoutDescriptor) -> Result<ExtractionResult> {
        self.run(layout).await
    }
}
