pub mod config;
pub mod extract;
pub mod generate;
pub mod worker;

pub use config::{handle_config_command, ConfigCommand};
pub use extract::{handle_extract_command, ExtractArgs};
pub use generate::{handle_generate_command, GenerateArgs};
pub use worker::run_worker;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use typeweave_config::{config_path_in, ConfigManager};
use typeweave_fs::NativeFileSystem;

/// `--config` if given, otherwise `./typeweave.toml`.
pub(crate) fn resolve_config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(|| config_path_in(Path::new(".")))
}

/// Loads and validates the project config.
pub(crate) async fn load_config(path: &Path) -> Result<ConfigManager<NativeFileSystem>> {
    let manager = ConfigManager::load_from(path).await.with_context(|| {
        format!(
            "Failed to load {}. Run 'typeweave config init' first.",
            path.display()
        )
    })?;
    manager
        .validate()
        .with_context(|| format!("Invalid config at {}", path.display()))?;
    Ok(manager)
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create tokio runtime")
}
