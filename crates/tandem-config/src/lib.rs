//! Tandem Configuration System
//!
//! Provides configuration management for mixed-language builds including:
//! - Project configuration (tandem.toml)
//! - Global user configuration (~/.tandem/config.toml)
//! - The compile order policy shared by every compile run
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.tandem/config.toml)
//! 2. Project config (./tandem.toml)
//! 3. Environment variables (TANDEM_*)
//!
//! # Example
//!
//! ```no_run
//! use tandem_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("compile order: {}", config.compile_order());
//! ```

pub mod global;
pub mod loader;
pub mod order;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use order::CompileOrder;
pub use project::{
    BuildConfig, CompileConfig, LanguagesConfig, ProjectConfig, ToolchainConfig,
    DEFAULT_PRIMARY_EXTENSION, DEFAULT_SECONDARY_EXTENSION,
};
