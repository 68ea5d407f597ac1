//! Capability probing: can this process run extraction in a worker?

use std::fmt;
use std::path::PathBuf;

/// Subcommand the typeweave binary answers as a worker.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// How to launch an isolated worker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds an argument (builder style).
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The running executable, invoked with the worker subcommand.
    ///
    /// Only correct when the running binary dispatches `worker` to
    /// [`serve`](crate::worker::serve), as the typeweave CLI does.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot report the current executable.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?).arg(WORKER_SUBCOMMAND))
    }
}

/// Reports whether isolated background execution is available.
///
/// Evaluated once per dispatch. Implementations must be cheap, side-effect
/// free and must answer `false` whenever availability cannot be determined:
/// the inline fallback is always safe, a probe failure would not be.
pub trait CapabilityProbe: Send + Sync + fmt::Debug {
    fn is_available(&self) -> bool;
}

/// Probe with a fixed answer, used to force a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe(bool);

impl StaticProbe {
    pub fn available() -> Self {
        Self(true)
    }

    pub fn unavailable() -> Self {
        Self(false)
    }
}

impl CapabilityProbe for StaticProbe {
    fn is_available(&self) -> bool {
        self.0
    }
}

/// Available iff the worker program exists as a regular file.
///
/// Only meaningful for a command known to serve the worker protocol; it
/// checks presence, not behaviour.
#[derive(Debug, Clone)]
pub struct WorkerBinaryProbe {
    command: WorkerCommand,
}

impl WorkerBinaryProbe {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }
}

impl CapabilityProbe for WorkerBinaryProbe {
    fn is_available(&self) -> bool {
        std::fs::metadata(&self.command.program)
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}
