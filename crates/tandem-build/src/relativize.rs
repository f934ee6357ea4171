//! Rewrites compiler dependency events into portable analysis events
//!
//! Source paths become relative to the source base directory and class
//! files relative to the output directory; paths outside their root are
//! kept absolute. A class dependency is a *product* dependency when the
//! class file lives in this run's output directory and an *external* one
//! otherwise.

use crate::events::{AnalysisEvent, AnalysisSink, DependencyEvent, DependencySink};
use crate::paths;
use std::path::{Path, PathBuf};

/// Path rewriting rules bound to one compile run's roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relativizer {
    base_directory: PathBuf,
    output_directory: PathBuf,
}

impl Relativizer {
    /// Both roots should be absolute; they are normalized here
    pub fn new(base_directory: impl AsRef<Path>, output_directory: impl AsRef<Path>) -> Self {
        Self {
            base_directory: paths::normalize(base_directory.as_ref()),
            output_directory: paths::normalize(output_directory.as_ref()),
        }
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Base-relative source path, or the path unchanged if outside the base
    pub fn source_path(&self, path: PathBuf) -> PathBuf {
        paths::relativize(&self.base_directory, &path).unwrap_or(path)
    }

    /// Output-relative class file path, or the path unchanged if outside the output
    pub fn class_path(&self, path: PathBuf) -> PathBuf {
        paths::relativize(&self.output_directory, &path).unwrap_or(path)
    }

    /// Map one compiler event to its analysis form
    pub fn relativize(&self, event: DependencyEvent) -> AnalysisEvent {
        match event {
            DependencyEvent::BeginSource { source } => AnalysisEvent::BeginSource {
                source: self.source_path(source),
            },
            DependencyEvent::EndSource { source } => AnalysisEvent::EndSource {
                source: self.source_path(source),
            },
            DependencyEvent::FoundSubclass {
                source,
                subclass_name,
                superclass_name,
                is_module,
            } => AnalysisEvent::FoundSubclass {
                source: self.source_path(source),
                subclass_name,
                superclass_name,
                is_module,
            },
            DependencyEvent::SuperclassNotFound { superclass_name } => {
                AnalysisEvent::SuperclassNotFound { superclass_name }
            }
            DependencyEvent::SourceDependency { depends_on, source } => {
                AnalysisEvent::SourceDependency {
                    depends_on: self.source_path(depends_on),
                    source: self.source_path(source),
                }
            }
            // jars belong to neither root
            DependencyEvent::JarDependency { jar, source } => AnalysisEvent::JarDependency {
                jar,
                source: self.source_path(source),
            },
            DependencyEvent::ClassDependency { class_file, source } => {
                let source = self.source_path(source);
                match paths::relativize(&self.output_directory, &class_file) {
                    Some(class_file) => AnalysisEvent::ProductDependency { class_file, source },
                    None => AnalysisEvent::ExternalClassDependency { class_file, source },
                }
            }
            DependencyEvent::GeneratedClass { source, class_file } => {
                AnalysisEvent::GeneratedClass {
                    source: self.source_path(source),
                    class_file: self.class_path(class_file),
                }
            }
            DependencyEvent::FoundApplication { source, class_name } => {
                AnalysisEvent::FoundApplication {
                    source: self.source_path(source),
                    class_name,
                }
            }
            DependencyEvent::Api { source, api } => AnalysisEvent::Api {
                source: self.source_path(source),
                api,
            },
        }
    }
}

/// Dependency sink handed to the primary compiler.
///
/// Every event is relativized and forwarded to the wrapped analysis sink
/// immediately, in the order the compiler emits it.
pub struct RelativizingSink<S: AnalysisSink> {
    relativizer: Relativizer,
    inner: S,
}

impl<S: AnalysisSink> RelativizingSink<S> {
    pub fn new(relativizer: Relativizer, inner: S) -> Self {
        Self { relativizer, inner }
    }

    pub fn relativizer(&self) -> &Relativizer {
        &self.relativizer
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AnalysisSink> DependencySink for RelativizingSink<S> {
    fn event(&mut self, event: DependencyEvent) {
        let event = self.relativizer.relativize(event);
        self.inner.event(event);
    }

    fn superclass_names(&self) -> &[String] {
        self.inner.superclass_names()
    }
}
