/// Build layer error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Could not create directory {path}: {error}")]
    DirectoryCreation {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to launch {program}: {error}")]
    ToolLaunch {
        program: PathBuf,
        error: std::io::Error,
    },

    #[error("Malformed dependency event from {program}: {error}")]
    MalformedEvent {
        program: PathBuf,
        error: serde_json::Error,
    },

    #[error("Failed to write dependency event: {0}")]
    EventWrite(std::io::Error),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),
}

impl BuildError {
    /// Create a directory creation error
    pub fn directory(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::DirectoryCreation {
            path: path.into(),
            error,
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a tool launch error
    pub fn launch(program: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::ToolLaunch {
            program: program.into(),
            error,
        }
    }
}
