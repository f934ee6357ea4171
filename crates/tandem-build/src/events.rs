//! Dependency events and the sinks that receive them
//!
//! A primary compiler reports what it learns about each source file as a
//! stream of [`DependencyEvent`]s carrying absolute paths. The analysis
//! store consumes [`AnalysisEvent`]s instead: the same facts with source
//! paths made base-relative, class files made output-relative, and class
//! dependencies split into external and product dependencies.
//!
//! Both event types serialize as internally tagged JSON objects
//! (`{"kind": "begin_source", "source": "..."}`) so they can cross a
//! process boundary one line at a time.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Event emitted by a primary compiler, with absolute paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyEvent {
    /// Compiler started analyzing a source file
    BeginSource { source: PathBuf },
    /// Compiler finished analyzing a source file
    EndSource { source: PathBuf },
    /// A class or module in `source` extends one of the requested superclasses
    FoundSubclass {
        source: PathBuf,
        subclass_name: String,
        superclass_name: String,
        is_module: bool,
    },
    /// A requested superclass is not on the classpath
    SuperclassNotFound { superclass_name: String },
    /// `source` depends on another source file of this run
    SourceDependency { depends_on: PathBuf, source: PathBuf },
    /// `source` depends on a class inside a jar
    JarDependency { jar: PathBuf, source: PathBuf },
    /// `source` depends on a class file on disk
    ClassDependency { class_file: PathBuf, source: PathBuf },
    /// Compiling `source` produced `class_file`
    GeneratedClass { source: PathBuf, class_file: PathBuf },
    /// `source` defines a runnable entry point
    FoundApplication { source: PathBuf, class_name: String },
    /// Public API descriptor of `source`
    Api { source: PathBuf, api: String },
}

/// Event delivered to the analysis store, with portable paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisEvent {
    BeginSource {
        source: PathBuf,
    },
    EndSource {
        source: PathBuf,
    },
    FoundSubclass {
        source: PathBuf,
        subclass_name: String,
        superclass_name: String,
        is_module: bool,
    },
    SuperclassNotFound {
        superclass_name: String,
    },
    SourceDependency {
        depends_on: PathBuf,
        source: PathBuf,
    },
    JarDependency {
        jar: PathBuf,
        source: PathBuf,
    },
    /// Dependency on a class file outside this run's output directory;
    /// `class_file` stays absolute
    ExternalClassDependency {
        class_file: PathBuf,
        source: PathBuf,
    },
    /// Dependency on a class file this run itself produces;
    /// `class_file` is relative to the output directory
    ProductDependency {
        class_file: PathBuf,
        source: PathBuf,
    },
    GeneratedClass {
        source: PathBuf,
        class_file: PathBuf,
    },
    FoundApplication {
        source: PathBuf,
        class_name: String,
    },
    Api {
        source: PathBuf,
        api: String,
    },
}

impl AnalysisEvent {
    /// Source file this event is about, if any
    pub fn source(&self) -> Option<&PathBuf> {
        match self {
            Self::SuperclassNotFound { .. } => None,
            Self::BeginSource { source }
            | Self::EndSource { source }
            | Self::FoundSubclass { source, .. }
            | Self::SourceDependency { source, .. }
            | Self::JarDependency { source, .. }
            | Self::ExternalClassDependency { source, .. }
            | Self::ProductDependency { source, .. }
            | Self::GeneratedClass { source, .. }
            | Self::FoundApplication { source, .. }
            | Self::Api { source, .. } => Some(source),
        }
    }
}

/// Callback interface a primary compiler reports into
pub trait DependencySink {
    fn event(&mut self, event: DependencyEvent);

    /// Superclass names the compiler should report `FoundSubclass` for
    fn superclass_names(&self) -> &[String] {
        &[]
    }
}

/// Interface of the incremental analysis store
pub trait AnalysisSink {
    fn event(&mut self, event: AnalysisEvent);

    /// Superclass names the store wants subclass reports for
    fn superclass_names(&self) -> &[String] {
        &[]
    }
}

impl<S: AnalysisSink + ?Sized> AnalysisSink for &mut S {
    fn event(&mut self, event: AnalysisEvent) {
        (**self).event(event)
    }

    fn superclass_names(&self) -> &[String] {
        (**self).superclass_names()
    }
}

impl<S: AnalysisSink + ?Sized> AnalysisSink for Box<S> {
    fn event(&mut self, event: AnalysisEvent) {
        (**self).event(event)
    }

    fn superclass_names(&self) -> &[String] {
        (**self).superclass_names()
    }
}

/// In-memory analysis sink keeping events in arrival order
#[derive(Debug, Clone, Default)]
pub struct AnalysisRecorder {
    events: Vec<AnalysisEvent>,
    superclass_names: Vec<String>,
}

impl AnalysisRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask compilers to report subclasses of these names
    pub fn with_superclass_names(mut self, names: Vec<String>) -> Self {
        self.superclass_names = names;
        self
    }

    pub fn events(&self) -> &[AnalysisEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<AnalysisEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Class files generated from `source`, in report order
    pub fn generated_classes(&self, source: &std::path::Path) -> Vec<&PathBuf> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AnalysisEvent::GeneratedClass {
                    source: s,
                    class_file,
                } if s == source => Some(class_file),
                _ => None,
            })
            .collect()
    }
}

impl AnalysisSink for AnalysisRecorder {
    fn event(&mut self, event: AnalysisEvent) {
        self.events.push(event);
    }

    fn superclass_names(&self) -> &[String] {
        &self.superclass_names
    }
}

/// Analysis sink streaming each event as one JSON line.
///
/// Sinks cannot fail mid-compile, so the first write error is kept,
/// later events are dropped, and [`JsonLinesSink::finish`] reports it.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    /// Number of events written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the writer, or the first write error
    pub fn finish(mut self) -> BuildResult<W> {
        if let Some(error) = self.error.take() {
            return Err(BuildError::EventWrite(error));
        }
        self.writer.flush().map_err(BuildError::EventWrite)?;
        Ok(self.writer)
    }

    fn write_line(&mut self, event: &AnalysisEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> AnalysisSink for JsonLinesSink<W> {
    fn event(&mut self, event: AnalysisEvent) {
        if self.error.is_some() {
            return;
        }
        match self.write_line(&event) {
            Ok(()) => self.written += 1,
            Err(error) => self.error = Some(error),
        }
    }
}

/// Read analysis events written by a [`JsonLinesSink`]; blank lines are skipped
pub fn read_json_lines(reader: impl BufRead) -> BuildResult<Vec<AnalysisEvent>> {
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|e| {
            BuildError::BuildFailed(format!("Invalid analysis event '{}': {}", line, e))
        })?;
        events.push(event);
    }
    Ok(events)
}
