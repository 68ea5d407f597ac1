//! Root-scoped filesystem abstraction for typeweave.
//!
//! This crate provides a `FileSystem` trait with a native implementation
//! (using `std::fs` on tokio's blocking pool) and an in-memory one used by
//! tests. Both refuse paths that escape their project root.
//!
//! # Example
//!
//! ```no_run
//! use typeweave_fs::{FileSystem, NativeFileSystem};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = NativeFileSystem::new(".")?;
//! fs.write_atomic(Path::new("src/generated/types.rs"), "// generated\n").await?;
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::{temp_path_for, FileMetadata, FileSystem};

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::NativeFileSystem;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "memory")]
pub use memory::MemoryFileSystem;
