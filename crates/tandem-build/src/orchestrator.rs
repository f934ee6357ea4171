//! Mixed-language compile orchestration
//!
//! Splits a source set between the primary and secondary compilers, makes
//! sure the output directory exists, and runs the two compilers one after
//! the other in the configured order. The first failure stops the run.
//!
//! The order switch is two-way: `SecondaryThenPrimary` runs the secondary
//! compiler first, every other order runs the primary compiler first.

use crate::action::{Action, DocGenerate, ObjectCompile};
use crate::compiler::{CompileFailed, Invocation, PrimaryCompiler, SecondaryCompiler};
use crate::error::{BuildError, BuildResult};
use crate::events::{AnalysisRecorder, AnalysisSink};
use crate::paths;
use crate::report::LoggingReporter;
use crate::sources::{partition, LanguageExtensions, Partition, SourceSet};

use std::fs;
use std::path::{Path, PathBuf};
use tandem_config::{CompileOrder, Config};
use tracing::{debug, error, info};

/// Outcome of one orchestrated run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileResult {
    Success,
    Failure { message: String },
}

impl CompileResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { message } => Some(message),
        }
    }

    pub fn into_result(self) -> BuildResult<()> {
        match self {
            Self::Success => Ok(()),
            Self::Failure { message } => Err(BuildError::BuildFailed(message)),
        }
    }
}

/// Inputs of one orchestrated run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Shown in status messages, e.g. "main" or "test"
    pub label: String,
    pub sources: SourceSet,
    /// Kept in the given order, unlike sources
    pub classpath: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub primary_options: Vec<String>,
    pub secondary_options: Vec<String>,
    pub order: CompileOrder,
}

impl CompileRequest {
    pub fn new(
        label: impl Into<String>,
        sources: SourceSet,
        output_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            sources,
            classpath: Vec::new(),
            output_directory: output_directory.into(),
            primary_options: Vec::new(),
            secondary_options: Vec::new(),
            order: CompileOrder::default(),
        }
    }

    /// Request with output, classpath, options and order taken from `config`
    pub fn from_config(config: &Config, label: impl Into<String>, sources: SourceSet) -> Self {
        Self {
            label: label.into(),
            sources,
            classpath: config.classpath(),
            output_directory: config.output_dir(),
            primary_options: config.primary_options().to_vec(),
            secondary_options: config.secondary_options().to_vec(),
            order: config.compile_order(),
        }
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn with_order(mut self, order: CompileOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_primary_options(mut self, options: Vec<String>) -> Self {
        self.primary_options = options;
        self
    }

    pub fn with_secondary_options(mut self, options: Vec<String>) -> Self {
        self.secondary_options = options;
        self
    }
}

/// Drives both compilers for a source set
pub struct Orchestrator<'a> {
    primary: &'a dyn PrimaryCompiler,
    secondary: &'a dyn SecondaryCompiler,
    /// Root that source paths in dependency events are made relative to
    base_directory: PathBuf,
    extensions: LanguageExtensions,
    max_errors: usize,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        primary: &'a dyn PrimaryCompiler,
        secondary: &'a dyn SecondaryCompiler,
        base_directory: impl AsRef<Path>,
    ) -> Self {
        Self {
            primary,
            secondary,
            base_directory: paths::canonical(base_directory.as_ref()),
            extensions: LanguageExtensions::default(),
            max_errors: 100,
        }
    }

    /// Orchestrator using the source directory, extensions and error bound of `config`
    pub fn from_config(
        primary: &'a dyn PrimaryCompiler,
        secondary: &'a dyn SecondaryCompiler,
        config: &Config,
    ) -> Self {
        Self::new(primary, secondary, config.source_dir())
            .with_extensions(LanguageExtensions::from_config(config))
            .with_max_errors(config.max_errors())
    }

    pub fn with_extensions(mut self, extensions: LanguageExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Compile to class files, forwarding relativized dependency events to `sink`
    pub fn compile(&self, request: &CompileRequest, sink: &mut dyn AnalysisSink) -> CompileResult {
        self.run(&ObjectCompile, request, sink)
    }

    /// Generate API documentation into the request's output directory
    pub fn document(&self, request: &CompileRequest) -> CompileResult {
        let mut unused = AnalysisRecorder::new();
        self.run(&DocGenerate, request, &mut unused)
    }

    pub fn run(
        &self,
        action: &dyn Action,
        request: &CompileRequest,
        sink: &mut dyn AnalysisSink,
    ) -> CompileResult {
        let split = partition(&request.sources, request.order, &self.extensions);

        if request.sources.is_empty() {
            info!("{}", action.nothing_to_do_message());
            return CompileResult::Success;
        }

        info!("{}", action.start_message(&request.label));

        if let Err(e) = fs::create_dir_all(&request.output_directory) {
            let err = BuildError::directory(&request.output_directory, e);
            error!("{}", err);
            return CompileResult::failure(err.to_string());
        }
        // Match the canonical form of the sources so class files relativize
        let output_directory = paths::canonical(&request.output_directory);

        info!(
            order = %request.order,
            "Compiling {} primary and {} secondary sources to {}...",
            split.primary.len(),
            split.secondary.len(),
            output_directory.display()
        );

        let mut reporter = LoggingReporter::new(self.max_errors);
        let outcome = self.execute(
            action,
            request,
            &split,
            &output_directory,
            sink,
            &mut reporter,
        );

        if let Some(summary) = reporter.summary() {
            info!("{}", summary);
        }

        match outcome {
            Ok(()) => {
                info!("{}", action.success_message());
                CompileResult::Success
            }
            Err(failed) => {
                let message = format!("Compiler error: {}", failed);
                error!("{}", message);
                CompileResult::failure(message)
            }
        }
    }

    fn execute(
        &self,
        action: &dyn Action,
        request: &CompileRequest,
        split: &Partition,
        output_directory: &Path,
        sink: &mut dyn AnalysisSink,
        reporter: &mut LoggingReporter,
    ) -> Result<(), CompileFailed> {
        let primary = self.invocation(
            action,
            request,
            &split.primary,
            &request.primary_options,
            output_directory,
        );
        let secondary = self.invocation(
            action,
            request,
            &split.secondary,
            &request.secondary_options,
            output_directory,
        );

        match request.order {
            CompileOrder::SecondaryThenPrimary => {
                self.run_secondary(action, secondary)?;
                self.run_primary(action, primary, sink, reporter)
            }
            _ => {
                self.run_primary(action, primary, sink, reporter)?;
                self.run_secondary(action, secondary)
            }
        }
    }

    fn invocation(
        &self,
        action: &dyn Action,
        request: &CompileRequest,
        sources: &SourceSet,
        options: &[String],
        output_directory: &Path,
    ) -> Invocation {
        Invocation {
            sources: sources.to_vec(),
            classpath: request.classpath.clone(),
            output_directory: output_directory.to_path_buf(),
            options: options.to_vec(),
            generate_executables: action.generate_executables(),
            max_errors: self.max_errors,
        }
    }

    fn run_primary(
        &self,
        action: &dyn Action,
        invocation: Invocation,
        sink: &mut dyn AnalysisSink,
        reporter: &mut LoggingReporter,
    ) -> Result<(), CompileFailed> {
        if invocation.sources.is_empty() {
            debug!("No primary sources.");
            return Ok(());
        }
        action.primary_step(
            self.primary,
            &invocation,
            &self.base_directory,
            sink,
            reporter,
        )
    }

    fn run_secondary(&self, action: &dyn Action, invocation: Invocation) -> Result<(), CompileFailed> {
        if invocation.sources.is_empty() {
            debug!("No secondary sources.");
            return Ok(());
        }
        action.secondary_step(self.secondary, &invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{SecondaryTool, ToolOutput};
    use crate::events::{AnalysisEvent, DependencyEvent, DependencySink};
    use crate::report::Reporter;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        PrimaryCompile(Vec<PathBuf>),
        PrimaryDocument(Vec<PathBuf>),
        Secondary(SecondaryTool, Vec<String>),
    }

    #[derive(Default)]
    struct Log {
        calls: RefCell<Vec<Call>>,
    }

    struct SpyPrimary<'l> {
        log: &'l Log,
        fail: bool,
    }

    impl PrimaryCompiler for SpyPrimary<'_> {
        fn compile(
            &self,
            invocation: &Invocation,
            sink: &mut dyn DependencySink,
            _reporter: &mut dyn Reporter,
        ) -> Result<(), CompileFailed> {
            self.log
                .calls
                .borrow_mut()
                .push(Call::PrimaryCompile(invocation.sources.clone()));
            for source in &invocation.sources {
                sink.event(DependencyEvent::BeginSource {
                    source: source.clone(),
                });
            }
            if self.fail {
                return Err(CompileFailed::message("type mismatch"));
            }
            Ok(())
        }

        fn document(
            &self,
            invocation: &Invocation,
            _reporter: &mut dyn Reporter,
        ) -> Result<(), CompileFailed> {
            self.log
                .calls
                .borrow_mut()
                .push(Call::PrimaryDocument(invocation.sources.clone()));
            Ok(())
        }
    }

    struct SpySecondary<'l> {
        log: &'l Log,
        exit_code: i32,
    }

    impl SecondaryCompiler for SpySecondary<'_> {
        fn run(&self, tool: SecondaryTool, arguments: &[String]) -> BuildResult<ToolOutput> {
            self.log
                .calls
                .borrow_mut()
                .push(Call::Secondary(tool, arguments.to_vec()));
            Ok(ToolOutput {
                exit_code: self.exit_code,
                ..ToolOutput::default()
            })
        }
    }

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path().canonicalize().unwrap();
            Self { _dir: dir, root }
        }

        fn sources(&self, names: &[&str]) -> SourceSet {
            names.iter().map(|n| self.root.join("src").join(n)).collect()
        }

        fn output(&self) -> PathBuf {
            self.root.join("out").join("classes")
        }
    }

    fn kinds(log: &Log) -> Vec<&'static str> {
        log.calls
            .borrow()
            .iter()
            .map(|c| match c {
                Call::PrimaryCompile(_) => "primary",
                Call::PrimaryDocument(_) => "primary-doc",
                Call::Secondary(SecondaryTool::Compiler, _) => "secondary",
                Call::Secondary(SecondaryTool::Documenter, _) => "secondary-doc",
            })
            .collect()
    }

    #[test]
    fn test_empty_sources_do_nothing() {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", SourceSet::new(), fx.output());
        let mut sink = AnalysisRecorder::new();

        assert_eq!(orchestrator.compile(&request, &mut sink), CompileResult::Success);
        assert_eq!(orchestrator.document(&request), CompileResult::Success);
        assert!(log.calls.borrow().is_empty());
        assert!(!fx.output().exists());
    }

    #[rstest]
    #[case(CompileOrder::Mixed, vec!["primary", "secondary"])]
    #[case(CompileOrder::PrimaryThenSecondary, vec!["primary", "secondary"])]
    #[case(CompileOrder::SecondaryThenPrimary, vec!["secondary", "primary"])]
    fn test_execution_order(#[case] order: CompileOrder, #[case] expected: Vec<&str>) {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(&["A.scala", "B.java"]), fx.output())
            .with_order(order);
        let mut sink = AnalysisRecorder::new();

        assert!(orchestrator.compile(&request, &mut sink).is_success());
        assert_eq!(kinds(&log), expected);
        assert!(fx.output().is_dir());
    }

    #[test]
    fn test_mixed_primary_receives_all_sources() {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let sources = fx.sources(&["A.scala", "B.java"]);
        let request = CompileRequest::new("main", sources.clone(), fx.output());
        let mut sink = AnalysisRecorder::new();
        orchestrator.compile(&request, &mut sink);

        let calls = log.calls.borrow();
        assert_eq!(calls[0], Call::PrimaryCompile(sources.to_vec()));
        match &calls[1] {
            Call::Secondary(_, args) => {
                assert!(args.iter().any(|a| a.ends_with("B.java")));
                assert!(!args.iter().any(|a| a.ends_with("A.scala")));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_primary_failure_skips_secondary() {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: true };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(&["A.scala", "B.java"]), fx.output());
        let mut sink = AnalysisRecorder::new();
        let result = orchestrator.compile(&request, &mut sink);

        assert_eq!(result, CompileResult::failure("Compiler error: type mismatch"));
        assert_eq!(kinds(&log), vec!["primary"]);
    }

    #[test]
    fn test_secondary_failure_skips_primary() {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 1 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(&["A.scala", "B.java"]), fx.output())
            .with_order(CompileOrder::SecondaryThenPrimary);
        let mut sink = AnalysisRecorder::new();
        let result = orchestrator.compile(&request, &mut sink);

        let message = result.message().unwrap();
        assert!(message.starts_with("Compiler error: secondary compiler returned exit code 1"));
        assert!(message.contains("B.java"));
        assert_eq!(kinds(&log), vec!["secondary"]);
        assert!(sink.is_empty());
    }

    #[rstest]
    #[case(&["A.scala"], vec!["primary"])]
    #[case(&["B.java"], vec!["secondary"])]
    #[case(&["notes.txt"], vec![])]
    fn test_empty_partition_is_skipped(#[case] names: &[&str], #[case] expected: Vec<&str>) {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(names), fx.output())
            .with_order(CompileOrder::PrimaryThenSecondary);
        let mut sink = AnalysisRecorder::new();

        assert!(orchestrator.compile(&request, &mut sink).is_success());
        assert_eq!(kinds(&log), expected);
        // Created even when neither compiler runs
        assert!(fx.output().is_dir());
    }

    #[test]
    fn test_directory_failure_invokes_nothing() {
        let fx = Fixture::new();
        let blocker = fx.root.join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(&["A.scala"]), blocker.join("classes"));
        let mut sink = AnalysisRecorder::new();
        let result = orchestrator.compile(&request, &mut sink);

        assert!(!result.is_success());
        assert!(result.message().unwrap().starts_with("Could not create directory"));
        assert!(log.calls.borrow().is_empty());
    }

    #[test]
    fn test_events_are_relativized_to_base() {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(&["a/A.scala"]), fx.output());
        let mut sink = AnalysisRecorder::new();
        orchestrator.compile(&request, &mut sink);

        assert_eq!(
            sink.events(),
            &[AnalysisEvent::BeginSource {
                source: PathBuf::from("a/A.scala")
            }]
        );
    }

    #[test]
    fn test_document_uses_documenters() {
        let fx = Fixture::new();
        let log = Log::default();
        let primary = SpyPrimary { log: &log, fail: false };
        let secondary = SpySecondary { log: &log, exit_code: 0 };
        let orchestrator = Orchestrator::new(&primary, &secondary, fx.root.join("src"));

        let request = CompileRequest::new("main", fx.sources(&["A.scala", "B.java"]), fx.output())
            .with_order(CompileOrder::SecondaryThenPrimary);

        assert!(orchestrator.document(&request).is_success());
        assert_eq!(kinds(&log), vec!["secondary-doc", "primary-doc"]);
    }

    #[test]
    fn test_into_result() {
        assert!(CompileResult::Success.into_result().is_ok());
        let err = CompileResult::failure("Compiler error: x")
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "Build failed: Compiler error: x");
    }
}
