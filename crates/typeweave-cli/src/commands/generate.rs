use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use typeweave_config::DispatchMode;
use typeweave_core::ModelBuilder;
use typeweave_schema::{RustModuleSink, SchemaModelBuilder};

use super::extract::dispatcher_builder;
use super::{load_config, resolve_config_path, runtime};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Configuration file path (default: ./typeweave.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn handle_generate_command(args: GenerateArgs) -> Result<()> {
    runtime()?.block_on(generate(args))
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config);
    let manager = load_config(&config_path).await?;
    let settings = manager.config();

    // Persisting needs the program model on this side, so build it here.
    let program = SchemaModelBuilder::new()
        .build(&manager.layout())
        .context("Failed to load schema modules")?;

    let sink = RustModuleSink::new(manager.filesystem(), settings.output.path.clone());
    let dispatcher = dispatcher_builder(DispatchMode::Inline, settings.dispatch.timeout())?
        .sink(Arc::new(sink))
        .build();

    let result = dispatcher
        .dispatch_and_persist(&program)
        .await
        .context("Generation failed")?;

    println!(
        "{} Generated {} type(s) into {}",
        "✓".green(),
        result.len(),
        manager.output_path().display()
    );
    Ok(())
}
