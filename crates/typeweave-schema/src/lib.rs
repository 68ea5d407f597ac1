//! Schema collaborators for the typeweave dispatcher.
//!
//! This crate provides the concrete program model builder, extractor and
//! result sink that the dispatcher drives:
//!
//! - [`SchemaModelBuilder`] reads and type-checks `.schema` modules
//! - [`TypeExtractor`] turns a [`SchemaProgram`] into an
//!   [`ExtractionResult`](typeweave_core::ExtractionResult)
//! - [`RustModuleSink`] persists the result as a generated Rust module
//!
//! # Example
//!
//! ```no_run
//! use typeweave_core::{Extractor, LayoutDescriptor, ModelBuilder};
//! use typeweave_schema::{SchemaModelBuilder, TypeExtractor};
//!
//! let layout = LayoutDescriptor::new(".").with_module("schema/user.schema");
//! let program = SchemaModelBuilder::new().build(&layout)?;
//! let result = TypeExtractor::new().extract(&program)?;
//! println!("Extracted {} types", result.len());
//! # Ok::<(), typeweave_core::Error>(())
//! ```

pub mod codegen;
pub mod extractor;
pub mod model;
pub mod parser;
pub mod sink;

pub use extractor::TypeExtractor;
pub use model::{SchemaModelBuilder, SchemaProgram, TypeDeclaration, BUILTIN_TYPES};
pub use sink::RustModuleSink;
