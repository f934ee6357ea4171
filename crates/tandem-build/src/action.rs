//! The two things the orchestrator can do with a mixed source set
use crate::compiler::{
    invoke_primary, invoke_secondary, CompileFailed, Invocation, PrimaryCompiler,
    SecondaryCompiler, SecondaryTool,
};
use crate::events::AnalysisSink;
use crate::report::Reporter;

use std::path::Path;

/// One orchestrated action: a step per language plus its status messages
pub trait Action {
    /// Whether compilers should emit class files
    fn generate_executables(&self) -> bool;

    /// Run the primary-language step
    fn primary_step(
        &self,
        compiler: &dyn PrimaryCompiler,
        invocation: &Invocation,
        base_directory: &Path,
        sink: &mut dyn AnalysisSink,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed>;

    /// Run the secondary-language step
    fn secondary_step(
        &self,
        compiler: &dyn SecondaryCompiler,
        invocation: &Invocation,
    ) -> Result<(), CompileFailed>;

    fn start_message(&self, label: &str) -> String;

    fn nothing_to_do_message(&self) -> &'static str;

    fn success_message(&self) -> &'static str;
}

/// Compile sources to class files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCompile;

impl Action for ObjectCompile {
    fn generate_executables(&self) -> bool {
        true
    }

    fn primary_step(
        &self,
        compiler: &dyn PrimaryCompiler,
        invocation: &Invocation,
        base_directory: &Path,
        sink: &mut dyn AnalysisSink,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed> {
        invoke_primary(compiler, invocation, base_directory, sink, reporter)
    }

    fn secondary_step(
        &self,
        compiler: &dyn SecondaryCompiler,
        invocation: &Invocation,
    ) -> Result<(), CompileFailed> {
        invoke_secondary(compiler, SecondaryTool::Compiler, invocation)
    }

    fn start_message(&self, label: &str) -> String {
        format!("Compiling {} sources...", label)
    }

    fn nothing_to_do_message(&self) -> &'static str {
        "Nothing to compile."
    }

    fn success_message(&self) -> &'static str {
        "Compilation successful."
    }
}

/// Generate API documentation; no dependency events are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocGenerate;

impl Action for DocGenerate {
    fn generate_executables(&self) -> bool {
        false
    }

    fn primary_step(
        &self,
        compiler: &dyn PrimaryCompiler,
        invocation: &Invocation,
        _base_directory: &Path,
        _sink: &mut dyn AnalysisSink,
        reporter: &mut dyn Reporter,
    ) -> Result<(), CompileFailed> {
        compiler.document(invocation, reporter)
    }

    fn secondary_step(
        &self,
        compiler: &dyn SecondaryCompiler,
        invocation: &Invocation,
    ) -> Result<(), CompileFailed> {
        invoke_secondary(compiler, SecondaryTool::Documenter, invocation)
    }

    fn start_message(&self, label: &str) -> String {
        format!("Generating API documentation for {} sources...", label)
    }

    fn nothing_to_do_message(&self) -> &'static str {
        "No sources specified."
    }

    fn success_message(&self) -> &'static str {
        "API documentation generation successful."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&ObjectCompile, "Compiling main sources...", "Nothing to compile.", "Compilation successful.")]
    #[case(
        &DocGenerate,
        "Generating API documentation for main sources...",
        "No sources specified.",
        "API documentation generation successful."
    )]
    fn test_messages(
        #[case] action: &dyn Action,
        #[case] start: &str,
        #[case] nothing: &str,
        #[case] success: &str,
    ) {
        assert_eq!(action.start_message("main"), start);
        assert_eq!(action.nothing_to_do_message(), nothing);
        assert_eq!(action.success_message(), success);
    }

    #[test]
    fn test_only_compile_generates_executables() {
        assert!(ObjectCompile.generate_executables());
        assert!(!DocGenerate.generate_executables());
    }
}
