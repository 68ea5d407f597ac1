//! Single-resolution state machine for one background dispatch.

use std::time::Duration;

use super::{ChannelEvent, ExecutionOutcome};
use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LatchState {
    Pending,
    Resolved,
}

/// Turns a stream of [`ChannelEvent`]s into exactly one [`ExecutionOutcome`].
///
/// ```text
///            Message / Error / Exited / close / time_out
///  Pending ──────────────────────────────────────────────▶ Resolved
///     │ Online                                                │ anything
///     └──────┘                                                └──────┘
/// ```
///
/// Every method returns `Some` at most once over the latch's lifetime.
/// Once resolved, every further event is a traced no-op.
#[derive(Debug)]
pub struct OutcomeLatch {
    state: LatchState,
}

impl Default for OutcomeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeLatch {
    pub fn new() -> Self {
        Self {
            state: LatchState::Pending,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state == LatchState::Resolved
    }

    /// Feeds one lifecycle event.
    pub fn observe(&mut self, event: ChannelEvent) -> Option<ExecutionOutcome> {
        if self.is_resolved() {
            tracing::trace!(event = event.name(), "Ignoring event after resolution");
            return None;
        }

        match event {
            ChannelEvent::Online => {
                tracing::trace!("Extraction worker online");
                None
            }
            ChannelEvent::Message(result) => {
                self.resolve(ExecutionOutcome::Success(result))
            }
            ChannelEvent::Error(cause) => {
                self.resolve(ExecutionOutcome::Failure(DispatchError::Worker { cause }))
            }
            ChannelEvent::Exited(code) => {
                tracing::trace!(?code, "Extraction worker exited before reporting");
                self.resolve(ExecutionOutcome::Failure(DispatchError::UnexpectedExit {
                    code,
                }))
            }
        }
    }

    /// The event stream ended. Resolves `UnexpectedExit` if still pending.
    pub fn close(&mut self) -> Option<ExecutionOutcome> {
        if self.is_resolved() {
            return None;
        }
        self.resolve(ExecutionOutcome::Failure(DispatchError::UnexpectedExit {
            code: None,
        }))
    }

    /// The wait bound elapsed. Resolves `TimedOut` if still pending.
    pub fn time_out(&mut self, timeout: Duration) -> Option<ExecutionOutcome> {
        if self.is_resolved() {
            return None;
        }
        self.resolve(ExecutionOutcome::Failure(DispatchError::TimedOut { timeout }))
    }

    fn resolve(&mut self, outcome: ExecutionOutcome) -> Option<ExecutionOutcome> {
        self.state = LatchState::Resolved;
        Some(outcome)
    }
}
