//! Entry point of the isolated worker process.
//!
//! The worker reads one [`WorkerInput`] line, builds its own program model,
//! extracts, writes exactly one [`WorkerFrame`] and exits.

use std::any::Any;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use typeweave_core::{Extractor, LayoutDescriptor, ModelBuilder};

use crate::executor::InlineExecutor;
use crate::protocol::{self, WorkerFrame, WorkerInput};

/// Serves one extraction request and returns the process exit code.
///
/// Exit code 0 means a result frame was written; 1 means an error frame was
/// written, or nothing could be written at all. Panics during building or
/// extraction are reported as error frames.
pub fn serve<B, X>(builder: B, extractor: X, input: impl BufRead, mut output: impl Write) -> i32
where
    B: ModelBuilder,
    X: Extractor<B::Model>,
{
    let frame = match protocol::read_input(input) {
        Ok(WorkerInput { layout }) => {
            extract_guarded(&InlineExecutor::new(builder, extractor), &layout)
        }
        Err(e) => WorkerFrame::Error {
            message: format!("invalid worker input: {e}"),
        },
    };

    let code = match &frame {
        WorkerFrame::Result { result } => {
            tracing::debug!(types = result.len(), "Worker extraction succeeded");
            0
        }
        WorkerFrame::Error { message } => {
            tracing::debug!(%message, "Worker extraction failed");
            1
        }
    };

    if let Err(e) = protocol::write_frame(&mut output, &frame) {
        tracing::error!("Failed to report worker outcome: {e}");
        return 1;
    }
    code
}

fn extract_guarded<B, X>(executor: &InlineExecutor<B, X>, layout: &LayoutDescriptor) -> WorkerFrame
where
    B: ModelBuilder,
    X: Extractor<B::Model>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| executor.run(layout))) {
        Ok(Ok(result)) => WorkerFrame::Result { result },
        Ok(Err(e)) => WorkerFrame::Error {
            message: e.to_string(),
        },
        Err(payload) => WorkerFrame::Error {
            message: format!("extraction panicked: {}", panic_message(payload.as_ref())),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
