use std::io;
use typeweave_dispatch::worker;
use typeweave_schema::{SchemaModelBuilder, TypeExtractor};

/// Hidden `worker` subcommand: one request on stdin, one frame on stdout.
///
/// Returns the process exit code.
pub fn run_worker() -> i32 {
    tracing::debug!(pid = std::process::id(), "Extraction worker started");
    worker::serve(
        SchemaModelBuilder::new(),
        TypeExtractor::new(),
        io::stdin().lock(),
        io::stdout().lock(),
    )
}
