//! Collaborator traits consumed by the dispatcher.
//!
//! The dispatcher does not know how a program model is built, what an
//! extraction computes, or where results end up. It only relies on these three
//! contracts.

use crate::error::Result;
use crate::types::{ExtractionResult, LayoutDescriptor};

/// Builds a program model from a layout descriptor.
///
/// Implementations must be deterministic given the same descriptor and the
/// same files on disk. Each execution context builds its own model; models are
/// never sent across a process boundary, so `Model` carries no serde bounds.
///
/// # Examples
///
/// ```
/// use typeweave_core::{LayoutDescriptor, ModelBuilder, Result};
///
/// struct CountingBuilder;
///
/// impl ModelBuilder for CountingBuilder {
///     type Model = usize;
///
///     fn build(&self, layout: &LayoutDescriptor) -> Result<usize> {
///         Ok(layout.modules.len())
///     }
/// }
///
/// let model = CountingBuilder.build(&LayoutDescriptor::default())?;
/// assert_eq!(model, 0);
/// # Ok::<(), typeweave_core::Error>(())
/// ```
pub trait ModelBuilder: Send + Sync {
    /// The in-memory, type-checked program representation.
    type Model;

    /// Builds and type-checks the program described by `layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if a module is missing, fails to parse, or fails to
    /// type-check.
    fn build(&self, layout: &LayoutDescriptor) -> Result<Self::Model>;
}

/// Pure function from a program model to an extraction result.
pub trait Extractor<M>: Send + Sync {
    /// Extracts type information from `model`.
    fn extract(&self, model: &M) -> Result<ExtractionResult>;
}

/// Persists an extraction result as generated source.
///
/// `persist` must not return until the write is durable (or has failed).
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    /// Writes `result` to the sink's destination.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Persistence`] when the destination cannot be
    /// written.
    async fn persist(&self, result: &ExtractionResult) -> Result<()>;
}
