//! Typeweave Core - shared data model and collaborator contracts.
//!
//! This crate provides the types that flow between typeweave's execution
//! contexts and the traits its dispatcher is written against:
//!
//! - [`LayoutDescriptor`]: serializable snapshot of a project's module layout
//! - [`ExtractionResult`]: serializable output of an extraction pass
//! - [`ModelBuilder`], [`Extractor`], [`ResultSink`]: the collaborators the
//!   dispatcher drives
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  typeweave-cli   │  (User interface + worker entry point)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │typeweave-dispatch│  (Inline / background execution)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐       ┌──────────────────┐
//! │  typeweave-core  │ ◀──── │ typeweave-schema │  (Concrete collaborators)
//! └──────────────────┘       └──────────────────┘
//! ```

pub mod error;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export core types for convenience
pub use error::{Error, Result};
pub use traits::{Extractor, ModelBuilder, ResultSink};
pub use types::{
    ExtractedField, ExtractedType, ExtractionResult, LayoutDescriptor, TypeKind, TypeRef,
};
