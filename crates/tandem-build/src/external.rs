//! Compilers running as external processes
//!
//! [`ExternalSecondaryCompiler`] launches the secondary toolchain's
//! executables, optionally passing arguments through an `@argfile` so long
//! source lists do not hit command-line limits. [`ExternalPrimaryCompiler`]
//! runs an out-of-process primary compiler that prints one JSON
//! [`DependencyEvent`] per stdout line and its diagnostics on stderr.

use crate::compiler::{
    arguments, CompileFailed, Invocation, PrimaryCompiler, SecondaryCompiler, SecondaryTool,
    ToolOutput,
};
use crate::error::{BuildError, BuildResult};
use crate::events::{DependencyEvent, DependencySink};
use crate::report::{Diagnostic, Reporter, Severity};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tandem_config::Config;
use tracing::debug;

/// Secondary toolchain reached through its executables
#[derive(Debug, Clone)]
pub struct ExternalSecondaryCompiler {
    compiler: PathBuf,
    documenter: PathBuf,
    argument_file: bool,
    working_directory: Option<PathBuf>,
}

impl ExternalSecondaryCompiler {
    pub fn new(compiler: impl Into<PathBuf>, documenter: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            documenter: documenter.into(),
            argument_file: true,
            working_directory: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut compiler = Self::new(config.secondary_compiler(), config.secondary_doc())
            .with_argument_file(config.argument_file());
        if let Some(root) = config.project_root() {
            compiler = compiler.with_working_directory(root);
        }
        compiler
    }

    /// Pass arguments through an @argfile instead of the command line
    pub fn with_argument_file(mut self, argument_file: bool) -> Self {
        self.argument_file = argument_file;
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn program(&self, tool: SecondaryTool) -> &Path {
        match tool {
            SecondaryTool::Compiler => &self.compiler,
            SecondaryTool::Documenter => &self.documenter,
        }
    }
}

impl SecondaryCompiler for ExternalSecondaryCompiler {
    fn run(&self, tool: SecondaryTool, args: &[String]) -> BuildResult<ToolOutput> {
        let program = self.program(tool);
        let mut command = Command::new(program);
        if let Some(dir) = &self.working_directory {
            command.current_dir(dir);
        }

        // Removed on drop, so it must outlive the process
        let mut argfile_dir = None;
        if self.argument_file {
            let dir = tempfile::Builder::new()
                .prefix("tandem-args")
                .tempdir()
                .map_err(BuildError::Io)?;
            let argfile = dir.path().join("argfile");
            fs::write(&argfile, argument_file_contents(args))
                .map_err(|e| BuildError::io(&argfile, e))?;
            command.arg(format!("@{}", argfile.display()));
            argfile_dir = Some(dir);
        } else {
            command.args(args);
        }

        debug!(program = %program.display(), "launching {}", tool);
        let output = run_captured(program, &mut command);
        drop(argfile_dir);
        output
    }
}

/// Quote an argument for an @argfile when it contains whitespace, quotes or backslashes
pub fn quote_argument(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\');
    if !needs_quotes {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// One quoted argument per line
fn argument_file_contents(args: &[String]) -> String {
    let mut contents = String::new();
    for arg in args {
        contents.push_str(&quote_argument(arg));
        contents.push('\n');
    }
    contents
}

fn run_captured(program: &Path, command: &mut Command) -> BuildResult<ToolOutput> {
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| BuildError::launch(program, e))?;

    Ok(ToolOutput {
        // Killed by a signal counts as failure
        exit_code: output.status.code().unwrap_or(1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Primary compiler running out of process.
///
/// Every non-empty stdout line must be a JSON [`DependencyEvent`]; events
/// are forwarded to the sink in the order they were printed. Stderr lines
/// are parsed as `path:line: severity: message` diagnostics.
#[derive(Debug, Clone)]
pub struct ExternalPrimaryCompiler {
    compiler: PathBuf,
    documenter: PathBuf,
    working_directory: Option<PathBuf>,
}

impl ExternalPrimaryCompiler {
    pub fn new(compiler: impl Into<PathBuf>, documenter: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            documenter: documenter.into(),
            working_directory: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut compiler = Self::new(config.primary_compiler(), config.primary_doc());
        if let Some(root) = config.project_root() {
            compiler = compiler.with_working_directory(root);
        }
        compiler
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    fn run(
        &self,
        program: &Path,
        invocation: &Invocation,
        reporter: &mut dyn Reporter,
    ) -> Result<(Vec<String>, ToolOutput), CompileFailed> {
        let mut args = arguments(invocation);
        args.push("-Xmaxerrs".to_string());
        args.push(invocation.max_errors.to_string());

        let mut command = Command::new(program);
        command.args(&args);
        if let Some(dir) = &self.working_directory {
            command.current_dir(dir);
        }
        let output = match run_captured(program, &mut command) {
            Ok(output) => output,
            Err(e) => return Err(CompileFailed::new(args, e.to_string())),
        };

        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            reporter.report(parse_diagnostic(line));
        }

        Ok((args, output))
    }

    fn check_exit(
        program: &Path,
        args: Vec<String>,
        output: &ToolOutput,
        reporter: &dyn Reporter,
    ) -> Result<(), CompileFailed> {
        if output.success() {
            return Ok(());
        }
        Err(CompileFailed::new(
            args,
            format!(
                "{} returned exit code {} ({} errors)",
                program.display(),
                output.exit_code,
                reporter.error_count()
            ),
        ))
    }
}

impl PrimaryCompiler for ExternalPrimaryCompiler {
    fn compile(
        &self,
        invocation: &Invocation,
        sink: &mut dyn DependencySink,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed> {
        let (args, output) = self.run(&self.compiler, invocation, reporter)?;

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<DependencyEvent>(line) {
                Ok(event) => sink.event(event),
                Err(error) => {
                    let error = BuildError::MalformedEvent {
                        program: self.compiler.clone(),
                        error,
                    };
                    return Err(CompileFailed::new(args, error.to_string()));
                }
            }
        }

        Self::check_exit(&self.compiler, args, &output, reporter)
    }

    fn document(
        &self,
        invocation: &Invocation,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed> {
        let (args, output) = self.run(&self.documenter, invocation, reporter)?;
        Self::check_exit(&self.documenter, args, &output, reporter)
    }
}

/// Parse `path:line: severity: message`; anything else is an error message
pub fn parse_diagnostic(line: &str) -> Diagnostic {
    let line = line.trim_end();
    // The colon of a drive letter ("C:\src") is part of the path
    let drive = drive_prefix_len(line);
    let mut parts = line[drive..].splitn(4, ':');
    let fields = (parts.next(), parts.next(), parts.next(), parts.next());

    if let (Some(path), Some(line_no), Some(severity), Some(message)) = fields {
        if let Ok(line_no) = line_no.trim().parse::<u32>() {
            let severity = match severity.trim() {
                "warning" => Some(Severity::Warning),
                "error" => Some(Severity::Error),
                "info" | "note" => Some(Severity::Info),
                _ => None,
            };
            if let Some(severity) = severity {
                let path = format!("{}{}", &line[..drive], path);
                return Diagnostic::new(severity, message.trim()).at(path, line_no);
            }
        }
    }

    if let Some(rest) = line.strip_prefix("warning:") {
        return Diagnostic::warning(rest.trim());
    }
    Diagnostic::error(line.strip_prefix("error:").unwrap_or(line).trim())
}

fn drive_prefix_len(line: &str) -> usize {
    match line.as_bytes() {
        [letter, b':', b'\\' | b'/', ..] if letter.is_ascii_alphabetic() => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("-g", "-g")]
    #[case("/no/spaces/A.java", "/no/spaces/A.java")]
    #[case("/with space/A.java", "\"/with space/A.java\"")]
    #[case("C:\\src\\A.java", "\"C:\\\\src\\\\A.java\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("", "\"\"")]
    fn test_quote_argument(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote_argument(input), expected);
    }

    #[test]
    fn test_argument_file_one_per_line() {
        let args = vec!["-d".to_string(), "/out dir".to_string()];
        assert_eq!(argument_file_contents(&args), "-d\n\"/out dir\"\n");
    }

    #[test]
    fn test_parse_positioned_diagnostic() {
        assert_eq!(
            parse_diagnostic("src/A.scala:7: error: not found: value x"),
            Diagnostic::error("not found: value x").at("src/A.scala", 7)
        );
        assert_eq!(
            parse_diagnostic("src/A.scala:9: warning: deprecated"),
            Diagnostic::warning("deprecated").at("src/A.scala", 9)
        );
    }

    #[test]
    fn test_parse_diagnostic_with_drive_letter() {
        assert_eq!(
            parse_diagnostic("C:\\src\\A.scala:7: error: x"),
            Diagnostic::error("x").at("C:\\src\\A.scala", 7)
        );
        assert_eq!(
            parse_diagnostic("d:/work/B.scala:12: warning: unused import"),
            Diagnostic::warning("unused import").at("d:/work/B.scala", 12)
        );
    }

    #[test]
    fn test_parse_unpositioned_diagnostic() {
        assert_eq!(
            parse_diagnostic("warning: there were 2 feature warnings"),
            Diagnostic::warning("there were 2 feature warnings")
        );
        assert_eq!(
            parse_diagnostic("error: bad option: '-Xfoo'"),
            Diagnostic::error("bad option: '-Xfoo'")
        );
        assert_eq!(
            parse_diagnostic("something odd happened"),
            Diagnostic::error("something odd happened")
        );
    }

    #[test]
    fn test_program_selection() {
        let compiler = ExternalSecondaryCompiler::new("/jdk/bin/javac", "/jdk/bin/javadoc");
        assert_eq!(
            compiler.program(SecondaryTool::Compiler),
            Path::new("/jdk/bin/javac")
        );
        assert_eq!(
            compiler.program(SecondaryTool::Documenter),
            Path::new("/jdk/bin/javadoc")
        );
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let compiler = ExternalSecondaryCompiler::new(
            "/definitely/not/a/real/javac",
            "/definitely/not/a/real/javadoc",
        )
        .with_argument_file(false);

        let err = compiler
            .run(SecondaryTool::Compiler, &["-version".to_string()])
            .unwrap_err();
        assert!(matches!(err, BuildError::ToolLaunch { .. }));
    }
}
