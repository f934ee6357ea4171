//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::order::CompileOrder;
use crate::project::{ProjectConfig, ToolchainConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "tandem.toml";

const DEFAULT_SOURCE_DIR: &str = "src";
const DEFAULT_OUTPUT_DIR: &str = "target/classes";
const DEFAULT_MAX_ERRORS: usize = 100;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tandem/config.toml) - lowest priority
/// 2. Project config (./tandem.toml) - overrides global
/// 3. Environment variables (TANDEM_*) - overrides project
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tandem.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.tandem/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tandem.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // A missing or unreadable global config never blocks a build
        let global_config = self.load_global_config().unwrap_or_default();

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config().unwrap_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); no file found is not an error
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.tandem/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized: TANDEM_COMPILE_ORDER, TANDEM_MAX_ERRORS, TANDEM_SECONDARY_COMPILER
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(order) = env::var("TANDEM_COMPILE_ORDER") {
            let order = CompileOrder::parse(&order)?;
            config.compile.get_or_insert_with(Default::default).order = Some(order);
        }

        if let Ok(max_errors) = env::var("TANDEM_MAX_ERRORS") {
            let max_errors = max_errors
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "TANDEM_MAX_ERRORS".to_string(),
                    reason: e.to_string(),
                })?;
            config.compile.get_or_insert_with(Default::default).max_errors = Some(max_errors);
        }

        if let Ok(compiler) = env::var("TANDEM_SECONDARY_COMPILER") {
            config
                .toolchain
                .get_or_insert_with(Default::default)
                .secondary_compiler = Some(PathBuf::from(compiler));
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has tandem.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Get the effective compile order
    pub fn compile_order(&self) -> CompileOrder {
        self.project.compile_order().unwrap_or_default()
    }

    /// Get the effective primary compiler error bound
    pub fn max_errors(&self) -> usize {
        self.project
            .compile
            .as_ref()
            .and_then(|c| c.max_errors)
            .unwrap_or(DEFAULT_MAX_ERRORS)
    }

    /// Get the primary compiler options
    pub fn primary_options(&self) -> &[String] {
        self.project
            .compile
            .as_ref()
            .map(|c| c.primary_options.as_slice())
            .unwrap_or_default()
    }

    /// Get the secondary compiler options
    pub fn secondary_options(&self) -> &[String] {
        self.project
            .compile
            .as_ref()
            .map(|c| c.secondary_options.as_slice())
            .unwrap_or_default()
    }

    /// Get the primary-language source suffix
    pub fn primary_extension(&self) -> &str {
        self.project.primary_extension()
    }

    /// Get the secondary-language source suffix
    pub fn secondary_extension(&self) -> &str {
        self.project.secondary_extension()
    }

    /// Get the source base directory, resolved against the project root
    pub fn source_dir(&self) -> PathBuf {
        let source = self
            .project
            .build
            .as_ref()
            .and_then(|b| b.source.as_deref())
            .unwrap_or(Path::new(DEFAULT_SOURCE_DIR));
        self.resolve(source)
    }

    /// Get the class file output directory, resolved against the project root
    pub fn output_dir(&self) -> PathBuf {
        let output = self
            .project
            .build
            .as_ref()
            .and_then(|b| b.output.as_deref())
            .unwrap_or(Path::new(DEFAULT_OUTPUT_DIR));
        self.resolve(output)
    }

    /// Get the classpath entries, resolved against the project root
    pub fn classpath(&self) -> Vec<PathBuf> {
        self.project
            .build
            .as_ref()
            .map(|b| b.classpath.iter().map(|p| self.resolve(p)).collect())
            .unwrap_or_default()
    }

    /// Get the effective toolchain (project over global)
    pub fn toolchain(&self) -> ToolchainConfig {
        let mut toolchain = self.global.toolchain.clone().unwrap_or_default();
        if let Some(project) = &self.project.toolchain {
            toolchain.merge(project);
        }
        toolchain
    }

    /// Primary compiler executable
    pub fn primary_compiler(&self) -> PathBuf {
        self.toolchain()
            .primary_compiler
            .unwrap_or_else(|| PathBuf::from("scalac"))
    }

    /// Primary documentation generator executable
    pub fn primary_doc(&self) -> PathBuf {
        self.toolchain()
            .primary_doc
            .unwrap_or_else(|| PathBuf::from("scaladoc"))
    }

    /// Secondary compiler executable
    pub fn secondary_compiler(&self) -> PathBuf {
        self.toolchain()
            .secondary_compiler
            .unwrap_or_else(|| PathBuf::from("javac"))
    }

    /// Secondary documentation generator executable
    pub fn secondary_doc(&self) -> PathBuf {
        self.toolchain()
            .secondary_doc
            .unwrap_or_else(|| PathBuf::from("javadoc"))
    }

    /// Whether secondary-tool arguments go through an @argfile
    pub fn argument_file(&self) -> bool {
        self.toolchain().argument_file.unwrap_or(true)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
