//! Tandem build core
//!
//! Compiles a mixed set of primary- and secondary-language sources:
//! - Source sets and the partitioner deciding which compiler sees what
//! - Sequential orchestration of both compilers in the configured order
//! - Dependency event relativization for the incremental analysis store
//! - External-process compilers with @argfile support
//! - API documentation generation through the same pipeline

pub mod action;
pub mod compiler;
pub mod error;
pub mod events;
pub mod external;
pub mod orchestrator;
pub mod paths;
pub mod relativize;
pub mod report;
pub mod sources;

// Re-export main types
pub use action::{Action, DocGenerate, ObjectCompile};
pub use compiler::{
    arguments, invoke_primary, invoke_secondary, CompileFailed, Invocation, PrimaryCompiler,
    SecondaryCompiler, SecondaryTool, ToolOutput,
};
pub use error::{BuildError, BuildResult};
pub use events::{
    read_json_lines, AnalysisEvent, AnalysisRecorder, AnalysisSink, DependencyEvent,
    DependencySink, JsonLinesSink,
};
pub use external::{ExternalPrimaryCompiler, ExternalSecondaryCompiler};
pub use orchestrator::{CompileRequest, CompileResult, Orchestrator};
pub use relativize::{Relativizer, RelativizingSink};
pub use report::{Diagnostic, LoggingReporter, Reporter, Severity};
pub use sources::{partition, LanguageExtensions, Partition, SourceSet};

// Re-export config types for convenience
pub use tandem_config::{CompileOrder, Config, ConfigLoader};
