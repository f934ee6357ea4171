//! Narrow interfaces to the two compilers and the wrappers that drive them
//!
//! The primary compiler is called in-process through [`PrimaryCompiler`]
//! and reports dependency events into a sink. The secondary compiler is a
//! separate toolchain reached through [`SecondaryCompiler`], which only
//! runs a tool with an argument vector and reports how it went.

use crate::error::BuildResult;
use crate::events::{AnalysisSink, DependencySink};
use crate::paths;
use crate::relativize::{Relativizer, RelativizingSink};
use crate::report::Reporter;

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Everything one compiler call needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub sources: Vec<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub options: Vec<String>,
    /// False when generating documentation instead of class files
    pub generate_executables: bool,
    pub max_errors: usize,
}

/// A compiler reported failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailed {
    /// Argument vector of the failed call, empty for in-process calls
    pub arguments: Vec<String>,
    pub message: String,
}

impl CompileFailed {
    pub fn new(arguments: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            arguments,
            message: message.into(),
        }
    }

    /// Failure without an argument vector
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(Vec::new(), message)
    }
}

impl fmt::Display for CompileFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.arguments.is_empty() {
            write!(f, "\n  arguments: {}", self.arguments.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileFailed {}

/// Programmatic entry points of the primary compiler
pub trait PrimaryCompiler {
    /// Compile to class files, reporting dependency events into `sink`
    fn compile(
        &self,
        invocation: &Invocation,
        sink: &mut dyn DependencySink,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed>;

    /// Generate API documentation into the output directory
    fn document(
        &self,
        invocation: &Invocation,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed>;
}

/// The two tools of the secondary toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryTool {
    Compiler,
    Documenter,
}

impl SecondaryTool {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compiler => "secondary compiler",
            Self::Documenter => "secondary documenter",
        }
    }
}

impl fmt::Display for SecondaryTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Captured result of a tool run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined output, stderr first since that is where diagnostics go
    pub fn output(&self) -> String {
        let mut output = String::new();
        if !self.stderr.trim().is_empty() {
            output.push_str(self.stderr.trim_end());
        }
        if !self.stdout.trim().is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(self.stdout.trim_end());
        }
        output
    }
}

/// Launches secondary toolchain processes
pub trait SecondaryCompiler {
    /// Run `tool` with `arguments`; an error means the tool could not run at all
    fn run(&self, tool: SecondaryTool, arguments: &[String]) -> BuildResult<ToolOutput>;
}

/// Argument vector shared by every tool: `-d <output>`, the options,
/// `-classpath <entries>` when there are any, then the sources.
pub fn arguments(invocation: &Invocation) -> Vec<String> {
    let mut args = Vec::with_capacity(invocation.sources.len() + invocation.options.len() + 4);

    args.push("-d".to_string());
    args.push(invocation.output_directory.display().to_string());
    args.extend(invocation.options.iter().cloned());

    if !invocation.classpath.is_empty() {
        args.push("-classpath".to_string());
        args.push(paths::join_path_list(
            invocation.classpath.iter().map(PathBuf::as_path),
        ));
    }

    args.extend(invocation.sources.iter().map(|s| s.display().to_string()));
    args
}

/// Run the primary compiler with its events relativized against
/// `base_directory` and the invocation's output directory.
pub fn invoke_primary(
    compiler: &dyn PrimaryCompiler,
    invocation: &Invocation,
    base_directory: &Path,
    sink: &mut dyn AnalysisSink,
    reporter: &mut dyn Reporter,
) -> Result<(), CompileFailed> {
    let relativizer = Relativizer::new(base_directory, &invocation.output_directory);
    let mut adapter = RelativizingSink::new(relativizer, sink);
    compiler.compile(invocation, &mut adapter, reporter)
}

/// Run one secondary tool, failing on a launch error or non-zero exit
pub fn invoke_secondary(
    compiler: &dyn SecondaryCompiler,
    tool: SecondaryTool,
    invocation: &Invocation,
) -> Result<(), CompileFailed> {
    let args = arguments(invocation);
    debug!(%tool, arguments = %args.join(" "), "running secondary tool");

    let output = match compiler.run(tool, &args) {
        Ok(output) => output,
        Err(e) => return Err(CompileFailed::new(args, e.to_string())),
    };

    if !output.success() {
        let mut message = format!("{} returned exit code {}", tool, output.exit_code);
        let details = output.output();
        if !details.is_empty() {
            message.push('\n');
            message.push_str(&details);
        }
        return Err(CompileFailed::new(args, message));
    }

    for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
        warn!(%tool, "{}", line);
    }

    Ok(())
}
