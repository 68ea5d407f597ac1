use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Current config schema version.
pub const CONFIG_VERSION: &str = "1.0";

/// Per-project `typeweave.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            layout: LayoutConfig::default(),
            dispatch: DispatchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Which schema modules make up the project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Module root, relative to the directory holding `typeweave.toml`
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Modules in load order, relative to `root`
    #[serde(default)]
    pub modules: Vec<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            modules: Vec::new(),
        }
    }
}

/// How `typeweave extract` runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchConfig {
    #[serde(default)]
    pub mode: DispatchMode,

    /// Upper bound on one background extraction
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Execution mode preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Background when a worker is available, inline otherwise
    #[default]
    Auto,
    /// Always on the calling thread
    Inline,
    /// Always in a worker process
    Background,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Auto => "auto",
            DispatchMode::Inline => "inline",
            DispatchMode::Background => "background",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(DispatchMode::Auto),
            "inline" => Ok(DispatchMode::Inline),
            "background" => Ok(DispatchMode::Background),
            other => Err(format!(
                "Invalid dispatch mode '{}'. Expected auto, inline or background",
                other
            )),
        }
    }
}

/// Where `typeweave generate` writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Generated module, relative to the directory holding `typeweave.toml`
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_output_path() -> PathBuf {
    PathBuf::from("src/generated/types.rs")
}
