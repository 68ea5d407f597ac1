pub mod manager;
pub mod security;
pub mod types;

pub use manager::{config_path_in, ConfigError, ConfigManager, CONFIG_FILE_NAME};
pub use security::{
    validate_config, validate_layout_root, validate_module_path, validate_output_path,
    validate_timeout, validate_version, SecurityError,
};
pub use types::{
    DispatchConfig, DispatchMode, LayoutConfig, OutputConfig, ProjectConfig, CONFIG_VERSION,
};
