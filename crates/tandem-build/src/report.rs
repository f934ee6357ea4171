//! Compiler diagnostics and the log sink handed to the primary compiler
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message from a compiler, optionally tied to a source position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Attach a source position
    pub fn at(mut self, path: impl Into<PathBuf>, line: u32) -> Self {
        self.path = Some(path.into());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, "{}:{}: {}", path.display(), line, self.message),
            (Some(path), None) => write!(f, "{}: {}", path.display(), self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Log sink a compiler reports its diagnostics into
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);

    fn error_count(&self) -> usize;

    fn warning_count(&self) -> usize;

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Reporter forwarding diagnostics to `tracing`.
///
/// Errors beyond `max_errors` are counted but no longer logged.
#[derive(Debug, Clone)]
pub struct LoggingReporter {
    max_errors: usize,
    errors: usize,
    warnings: usize,
}

impl LoggingReporter {
    pub fn new(max_errors: usize) -> Self {
        Self {
            max_errors,
            errors: 0,
            warnings: 0,
        }
    }

    /// Summary line such as "2 errors, 1 warning found"
    pub fn summary(&self) -> Option<String> {
        fn plural(n: usize, word: &str) -> String {
            if n == 1 {
                format!("1 {}", word)
            } else {
                format!("{} {}s", n, word)
            }
        }

        match (self.errors, self.warnings) {
            (0, 0) => None,
            (0, w) => Some(format!("{} found", plural(w, "warning"))),
            (e, 0) => Some(format!("{} found", plural(e, "error"))),
            (e, w) => Some(format!(
                "{}, {} found",
                plural(e, "error"),
                plural(w, "warning")
            )),
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Reporter for LoggingReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                self.errors += 1;
                if self.errors <= self.max_errors {
                    error!("{}", diagnostic);
                }
            }
            Severity::Warning => {
                self.warnings += 1;
                warn!("{}", diagnostic);
            }
            Severity::Info => info!("{}", diagnostic),
        }
    }

    fn error_count(&self) -> usize {
        self.errors
    }

    fn warning_count(&self) -> usize {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(
            Diagnostic::error("type mismatch").at("src/A.scala", 12).to_string(),
            "src/A.scala:12: type mismatch"
        );
        assert_eq!(Diagnostic::warning("deprecated").to_string(), "deprecated");
    }

    #[test]
    fn test_logging_reporter_counts() {
        let mut reporter = LoggingReporter::new(1);
        reporter.report(Diagnostic::error("first"));
        reporter.report(Diagnostic::error("second"));
        reporter.report(Diagnostic::warning("careful"));
        reporter.report(Diagnostic::new(Severity::Info, "fyi"));

        assert_eq!(reporter.error_count(), 2);
        assert_eq!(reporter.warning_count(), 1);
        assert!(reporter.has_errors());
        assert_eq!(
            reporter.summary().as_deref(),
            Some("2 errors, 1 warning found")
        );
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(LoggingReporter::default().summary(), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
