//! Project Configuration (tandem.toml)
//!
//! Handles project-level configuration stored in `tandem.toml` at the project root.

use crate::order::CompileOrder;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Primary-language suffix when none is configured
pub const DEFAULT_PRIMARY_EXTENSION: &str = ".scala";

/// Secondary-language suffix when none is configured
pub const DEFAULT_SECONDARY_EXTENSION: &str = ".java";

/// Project configuration from tandem.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Source, output and classpath locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,

    /// Compile run settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile: Option<CompileConfig>,

    /// Source file extensions of the two languages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<LanguagesConfig>,

    /// Compiler executables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainConfig>,
}

/// Build locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Source base directory (default: "src")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Class file output directory (default: "target/classes")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Library classpath entries
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classpath: Vec<PathBuf>,
}

/// Compile run settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CompileConfig {
    /// Compile order policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<CompileOrder>,

    /// Maximum number of errors the primary compiler reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_errors: Option<usize>,

    /// Options passed to the primary compiler
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_options: Vec<String>,

    /// Options passed to the secondary compiler
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_options: Vec<String>,
}

/// Language file extensions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LanguagesConfig {
    /// Primary-language source suffix (default: ".scala")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_extension: Option<String>,

    /// Secondary-language source suffix (default: ".java")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_extension: Option<String>,
}

/// Compiler executables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ToolchainConfig {
    /// Primary compiler executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_compiler: Option<PathBuf>,

    /// Primary documentation generator executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_doc: Option<PathBuf>,

    /// Secondary compiler executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_compiler: Option<PathBuf>,

    /// Secondary documentation generator executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_doc: Option<PathBuf>,

    /// Pass secondary-tool arguments through an @argfile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument_file: Option<bool>,
}

impl ToolchainConfig {
    /// Merge another toolchain config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ToolchainConfig) {
        if other.primary_compiler.is_some() {
            self.primary_compiler = other.primary_compiler.clone();
        }
        if other.primary_doc.is_some() {
            self.primary_doc = other.primary_doc.clone();
        }
        if other.secondary_compiler.is_some() {
            self.secondary_compiler = other.secondary_compiler.clone();
        }
        if other.secondary_doc.is_some() {
            self.secondary_doc = other.secondary_doc.clone();
        }
        if other.argument_file.is_some() {
            self.argument_file = other.argument_file;
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(compile) = &self.compile {
            if compile.max_errors == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "compile.max-errors".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if let Some(languages) = &self.languages {
            if let Some(ext) = &languages.primary_extension {
                validate_extension("languages.primary-extension", ext)?;
            }
            if let Some(ext) = &languages.secondary_extension {
                validate_extension("languages.secondary-extension", ext)?;
            }
        }

        // Defaults count too: overriding one side to the other's default collides
        if self.primary_extension() == self.secondary_extension() {
            return Err(ConfigError::ValidationError(format!(
                "primary and secondary languages must use different extensions, both are '{}'",
                self.primary_extension()
            )));
        }

        // Build paths are resolved against the project root at load time,
        // nothing to check here.

        Ok(())
    }

    /// Get the configured compile order, if present
    pub fn compile_order(&self) -> Option<CompileOrder> {
        self.compile.as_ref().and_then(|c| c.order)
    }

    /// Effective primary-language suffix
    pub fn primary_extension(&self) -> &str {
        self.languages
            .as_ref()
            .and_then(|l| l.primary_extension.as_deref())
            .unwrap_or(DEFAULT_PRIMARY_EXTENSION)
    }

    /// Effective secondary-language suffix
    pub fn secondary_extension(&self) -> &str {
        self.languages
            .as_ref()
            .and_then(|l| l.secondary_extension.as_deref())
            .unwrap_or(DEFAULT_SECONDARY_EXTENSION)
    }
}

/// An extension is a literal file-name suffix such as ".java"
fn validate_extension(field: &str, ext: &str) -> ConfigResult<()> {
    if !ext.starts_with('.') || ext.len() < 2 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a suffix like '.java', got '{}'", ext),
        });
    }
    Ok(())
}
