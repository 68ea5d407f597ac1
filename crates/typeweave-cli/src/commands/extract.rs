use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use typeweave_config::{validate_timeout, DispatchMode};
use typeweave_dispatch::{Dispatcher, DispatcherBuilder, StaticProbe, WorkerCommand};
use typeweave_schema::{SchemaModelBuilder, TypeExtractor};

use super::{load_config, resolve_config_path, runtime};
use crate::formatters;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Configuration file path (default: ./typeweave.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Execution mode: auto, inline or background (overrides config)
    #[arg(long)]
    pub mode: Option<DispatchMode>,

    /// Background worker timeout in seconds (overrides config)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the extraction result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_extract_command(args: ExtractArgs) -> Result<()> {
    runtime()?.block_on(extract(args))
}

async fn extract(args: ExtractArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config);
    let manager = load_config(&config_path).await?;
    let settings = &manager.config().dispatch;

    let mode = args.mode.unwrap_or(settings.mode);
    let timeout_secs = args.timeout.unwrap_or(settings.timeout_secs);
    validate_timeout(timeout_secs)?;

    let dispatcher = dispatcher_builder(mode, Duration::from_secs(timeout_secs))?.build();
    let layout = manager.layout();
    tracing::info!(
        mode = %dispatcher.mode(),
        modules = layout.modules.len(),
        "Extracting types"
    );

    let result = dispatcher
        .dispatch(&layout)
        .await
        .context("Extraction failed")?;

    if args.json {
        formatters::json::print_json(&result)?;
    } else {
        formatters::human::print_summary(&result, dispatcher.mode());
    }
    Ok(())
}

/// Dispatcher builder for the schema collaborators, honouring the requested mode.
///
/// This binary serves the `worker` subcommand, so it relaunches itself as
/// the background worker.
pub(crate) fn dispatcher_builder(
    mode: DispatchMode,
    timeout: Duration,
) -> Result<DispatcherBuilder<SchemaModelBuilder, TypeExtractor>> {
    let builder =
        Dispatcher::builder(SchemaModelBuilder::new(), TypeExtractor::new()).timeout(timeout);
    let builder = match mode {
        DispatchMode::Inline => builder.probe(StaticProbe::unavailable()),
        DispatchMode::Auto => match WorkerCommand::current_exe() {
            Ok(command) => builder.worker_command(command),
            Err(e) => {
                tracing::debug!("Cannot locate own executable, extracting inline: {e}");
                builder.probe(StaticProbe::unavailable())
            }
        },
        DispatchMode::Background => {
            let command = WorkerCommand::current_exe()
                .context("Cannot locate the typeweave executable for background mode")?;
            builder
                .probe(StaticProbe::available())
                .worker_command(command)
        }
    };
    Ok(builder)
}
