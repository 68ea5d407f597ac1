//! Dual-mode extraction dispatcher.
//!
//! A [`Dispatcher`] runs `ModelBuilder` → `Extractor` either in an isolated
//! worker process or, when no worker is available, inline on the caller's
//! thread. Both paths resolve exactly once.
//!
//! ```text
//!  dispatch(layout)
//!        │
//!        ▼
//!  CapabilityProbe ──false──▶ InlineExecutor ─────────────────────┐
//!        │ true                (build + extract, blocking)         │
//!        ▼                                                         ▼
//!  ChannelExecutor ──spawn──▶ worker process                  ExtractionResult
//!        ▲                      │  stdin:  WorkerInput          or DispatchError
//!        │                      │  stdout: WorkerFrame
//!        └── OutcomeLatch ◀─────┘  (Online, Message | Error, Exited)
//! ```
//!
//! The worker side is [`worker::serve`]; the `typeweave` binary exposes it as
//! a hidden `worker` subcommand.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod probe;
pub mod protocol;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{
    ChannelEvent, ChannelExecutor, ContextHandle, ContextSpawner, ExecutionOutcome, OutcomeLatch,
    ProcessSpawner, SpawnedContext, DEFAULT_TIMEOUT,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, Result};
pub use executor::{ExecutionMode, Executor, InlineExecutor};
pub use probe::{CapabilityProbe, StaticProbe, WorkerBinaryProbe, WorkerCommand, WORKER_SUBCOMMAND};
pub use protocol::{WorkerFrame, WorkerInput};
