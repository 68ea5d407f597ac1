use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::PathBuf;
use typeweave_config::ConfigManager;

use super::{load_config, resolve_config_path, runtime};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Create typeweave.toml with defaults
    Init {
        /// Config file to create (default: ./typeweave.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Schema modules to list in the new config
        #[arg(long = "module", value_name = "PATH")]
        modules: Vec<PathBuf>,
    },

    /// Print the effective config
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate config file
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show config file path
    Path {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn handle_config_command(cmd: ConfigCommand) -> Result<()> {
    runtime()?.block_on(async {
        match cmd {
            ConfigCommand::Init { config, modules } => init_config(config, modules).await,
            ConfigCommand::Show { config } => show_config(config).await,
            ConfigCommand::Validate { config } => validate_config(config).await,
            ConfigCommand::Path { config } => show_config_path(config),
        }
    })
}

async fn init_config(config: Option<PathBuf>, modules: Vec<PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(config);

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("To reinitialize, please delete the existing config first.");
        return Ok(());
    }

    let mut manager = ConfigManager::init_at(&config_path)
        .await
        .with_context(|| format!("Failed to create {}", config_path.display()))?;

    if !modules.is_empty() {
        manager.config_mut().layout.modules = modules;
        manager
            .validate()
            .context("Refusing to write an invalid config")?;
        manager.save().await?;
    }

    println!(
        "{} Initialized config at: {}",
        "✓".green(),
        manager.path().display()
    );
    Ok(())
}

async fn show_config(config: Option<PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(config);
    let manager = ConfigManager::load_from(&config_path)
        .await
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    print!("{}", toml::to_string_pretty(manager.config())?);
    Ok(())
}

async fn validate_config(config: Option<PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(config);
    let manager = load_config(&config_path).await?;
    let config = manager.config();

    println!("{} Config is valid", "✓".green());
    println!("  Version: {}", config.version);
    println!("  Modules: {}", config.layout.modules.len());
    println!("  Dispatch: {} ({}s timeout)", config.dispatch.mode, config.dispatch.timeout_secs);
    println!("  Output: {}", config.output.path.display());

    // Missing modules are not a config error, but extraction will fail on them
    let layout = manager.layout();
    let missing: Vec<_> = layout
        .modules
        .iter()
        .filter(|m| !layout.resolve(m).is_file())
        .collect();

    if !missing.is_empty() {
        println!("\n{} Some modules do not exist yet:", "Warning:".yellow());
        for module in missing {
            println!("  - {}", module.display());
        }
    }

    Ok(())
}

fn show_config_path(config: Option<PathBuf>) -> Result<()> {
    println!("{}", resolve_config_path(config).display());
    Ok(())
}
