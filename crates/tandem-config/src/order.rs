//! Compile order policy
//!
//! Decides how the primary and secondary compilers see the source set of a
//! single compile run.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order in which the two compilers of a run are driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompileOrder {
    /// Both compilers receive the whole source set; the primary compiler
    /// parses secondary sources for type information only
    Mixed,
    /// Primary-language sources compile first
    PrimaryThenSecondary,
    /// Secondary-language sources compile first
    SecondaryThenPrimary,
}

impl CompileOrder {
    /// Parse a compile order from its configuration spelling
    pub fn parse(s: &str) -> ConfigResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "mixed" => Ok(Self::Mixed),
            "primary-then-secondary" => Ok(Self::PrimaryThenSecondary),
            "secondary-then-primary" => Ok(Self::SecondaryThenPrimary),
            other => Err(ConfigError::InvalidValue {
                field: "compile.order".to_string(),
                reason: format!(
                    "expected 'mixed', 'primary-then-secondary' or 'secondary-then-primary', got '{}'",
                    other
                ),
            }),
        }
    }

    /// Get the configuration spelling of this order
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::PrimaryThenSecondary => "primary-then-secondary",
            Self::SecondaryThenPrimary => "secondary-then-primary",
        }
    }

    /// Get all orders
    pub fn all() -> [CompileOrder; 3] {
        [
            Self::Mixed,
            Self::PrimaryThenSecondary,
            Self::SecondaryThenPrimary,
        ]
    }
}

#[allow(clippy::derivable_impls)]
impl Default for CompileOrder {
    fn default() -> Self {
        Self::Mixed
    }
}

impl fmt::Display for CompileOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
