use crate::security::{validate_config, SecurityError};
use crate::types::ProjectConfig;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use typeweave_core::LayoutDescriptor;
use typeweave_fs::FileSystem;

#[cfg(feature = "native-fs")]
use typeweave_fs::NativeFileSystem;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "typeweave.toml";

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Config file already exists at {0}")]
    ConfigExists(PathBuf),
}

/// Manager for a project's `typeweave.toml`
///
/// The filesystem is scoped to the directory holding the config file, and
/// relative paths inside the config resolve against that directory.
pub struct ConfigManager<F: FileSystem> {
    fs: Arc<F>,
    config_path: PathBuf,
    config: ProjectConfig,
}

/// Default config path for a project directory
pub fn config_path_in(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

fn config_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(feature = "native-fs")]
impl ConfigManager<NativeFileSystem> {
    /// Load config from a specific path
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let (fs, path) = Self::scoped(path)?;
        Self::load_with_filesystem(fs, &path).await
    }

    /// Initialize a new config file with defaults
    ///
    /// Fails if a config already exists at `path`.
    pub async fn init_at(path: &Path) -> Result<Self, ConfigError> {
        std::fs::create_dir_all(config_dir(path))?;
        let (fs, path) = Self::scoped(path)?;
        Self::init_with_filesystem(fs, &path, ProjectConfig::default()).await
    }

    /// Filesystem rooted at the config directory, plus the config path
    /// re-expressed inside that root.
    fn scoped(path: &Path) -> Result<(Arc<NativeFileSystem>, PathBuf), ConfigError> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a config file path: {}", path.display()),
            )
        })?;
        let fs = NativeFileSystem::new(config_dir(path))?;
        let path = fs.project_root().join(file_name);
        Ok((Arc::new(fs), path))
    }
}

impl<F: FileSystem> ConfigManager<F> {
    /// Load config with a custom FileSystem
    pub async fn load_with_filesystem(fs: Arc<F>, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path).await? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = fs.read_to_string(path).await?;
        let config: ProjectConfig = toml::from_str(&contents)?;

        Ok(Self {
            fs,
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Write `config` to a new file at `path`
    pub async fn init_with_filesystem(
        fs: Arc<F>,
        path: &Path,
        config: ProjectConfig,
    ) -> Result<Self, ConfigError> {
        if fs.exists(path).await? {
            return Err(ConfigError::ConfigExists(path.to_path_buf()));
        }

        let manager = Self {
            fs,
            config_path: path.to_path_buf(),
            config,
        };
        manager.save().await?;
        Ok(manager)
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and atomic rename to prevent corruption
    pub async fn save(&self) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(&self.config)?;
        self.fs.write_atomic(&self.config_path, &toml_str).await?;
        Ok(())
    }

    /// Get reference to config
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Get mutable reference to config (caller must call save())
    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    /// Path of the config file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Filesystem scoped to the config directory
    pub fn filesystem(&self) -> Arc<F> {
        Arc::clone(&self.fs)
    }

    /// Check the config for unsafe paths and unusable values
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_config(&self.config)?;
        Ok(())
    }

    /// Layout descriptor with the root resolved against the config directory
    pub fn layout(&self) -> LayoutDescriptor {
        LayoutDescriptor {
            root: self.resolve(&self.config.layout.root),
            modules: self.config.layout.modules.clone(),
        }
    }

    /// Generated module path resolved against the config directory
    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.config.output.path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let base = self.fs.project_root();
        if path == Path::new(".") {
            base.to_path_buf()
        } else {
            base.join(path)
        }
    }
}
