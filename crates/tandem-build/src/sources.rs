//! Source sets and the primary/secondary source partitioner
use crate::error::{BuildError, BuildResult};
use crate::paths;

use std::collections::btree_set::{self, BTreeSet};
use std::path::{Path, PathBuf};
use tandem_config::{
    CompileOrder, Config, DEFAULT_PRIMARY_EXTENSION, DEFAULT_SECONDARY_EXTENSION,
};
use walkdir::WalkDir;

/// Set of input files for one compile run.
///
/// Paths are stored in canonical absolute form, so the same file reached
/// through different spellings is only present once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    paths: BTreeSet<PathBuf>,
}

impl SourceSet {
    /// Create an empty source set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path; returns false if the canonical path was already present
    pub fn insert(&mut self, path: impl AsRef<Path>) -> bool {
        self.paths.insert(paths::canonical(path.as_ref()))
    }

    /// Membership by canonical path
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.paths.contains(&paths::canonical(path.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate in sorted path order
    pub fn iter(&self) -> btree_set::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    /// Paths as an owned vector, in sorted order
    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.paths.iter().cloned().collect()
    }

    /// Subset whose file names end with `suffix`
    pub fn filter_by_suffix(&self, suffix: &str) -> SourceSet {
        Self {
            paths: self
                .paths
                .iter()
                .filter(|p| has_suffix(p, suffix))
                .cloned()
                .collect(),
        }
    }

    /// Collect every file under `dir` whose name ends with one of `suffixes`
    pub fn discover(dir: impl AsRef<Path>, suffixes: &[&str]) -> BuildResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(BuildError::BuildFailed(format!(
                "Source directory not found: {}",
                dir.display()
            )));
        }

        let mut set = SourceSet::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                match e.into_io_error() {
                    Some(error) => BuildError::io(path, error),
                    None => BuildError::BuildFailed(format!(
                        "Filesystem loop while scanning {}",
                        path.display()
                    )),
                }
            })?;

            if entry.file_type().is_file()
                && suffixes.iter().any(|suffix| has_suffix(entry.path(), suffix))
            {
                set.insert(entry.path());
            }
        }

        Ok(set)
    }
}

impl<P: AsRef<Path>> FromIterator<P> for SourceSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = SourceSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a PathBuf;
    type IntoIter = btree_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Literal file-name suffix match (".java" matches "A.java", not "A.javax")
fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

/// File-name suffixes identifying the two languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageExtensions {
    pub primary: String,
    pub secondary: String,
}

impl LanguageExtensions {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.primary_extension(), config.secondary_extension())
    }
}

impl Default for LanguageExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_EXTENSION, DEFAULT_SECONDARY_EXTENSION)
    }
}

/// Sources handed to each compiler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub secondary: SourceSet,
    pub primary: SourceSet,
}

/// Split `sources` between the two compilers.
///
/// Secondary sources are always those with the secondary suffix. Under
/// `Mixed` the primary compiler sees the whole set, so it can read
/// secondary sources for their types; otherwise it only gets files with
/// the primary suffix. Files matching neither suffix are then compiled by
/// nobody.
pub fn partition(
    sources: &SourceSet,
    order: CompileOrder,
    extensions: &LanguageExtensions,
) -> Partition {
    let secondary = sources.filter_by_suffix(&extensions.secondary);
    let primary = match order {
        CompileOrder::Mixed => sources.clone(),
        _ => sources.filter_by_suffix(&extensions.primary),
    };

    Partition { secondary, primary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn set(paths: &[&str]) -> SourceSet {
        paths.iter().collect()
    }

    #[test]
    fn test_duplicates_collapse() {
        let sources = set(&["/p/src/A.scala", "/p/src/./A.scala", "/p/lib/../src/A.scala"]);
        assert_eq!(sources.len(), 1);
        assert!(sources.contains("/p/src/A.scala"));
    }

    #[test]
    fn test_suffix_is_literal() {
        assert!(has_suffix(Path::new("/a/B.java"), ".java"));
        assert!(!has_suffix(Path::new("/a/B.javax"), ".java"));
        assert!(!has_suffix(Path::new("/a.java/B.scala"), ".java"));
    }

    #[rstest]
    #[case(CompileOrder::PrimaryThenSecondary)]
    #[case(CompileOrder::SecondaryThenPrimary)]
    fn test_ordered_modes_filter_both_sides(#[case] order: CompileOrder) {
        let sources = set(&["/p/A.scala", "/p/B.java", "/p/notes.txt"]);
        let split = partition(&sources, order, &LanguageExtensions::default());

        assert_eq!(split.primary, set(&["/p/A.scala"]));
        assert_eq!(split.secondary, set(&["/p/B.java"]));
    }

    #[test]
    fn test_mixed_primary_sees_everything() {
        let sources = set(&["/p/A.scala", "/p/B.java", "/p/notes.txt"]);
        let split = partition(&sources, CompileOrder::Mixed, &LanguageExtensions::default());

        assert_eq!(split.primary, sources);
        assert_eq!(split.secondary, set(&["/p/B.java"]));
    }

    #[test]
    fn test_custom_extensions() {
        let sources = set(&["/p/A.kt", "/p/B.java", "/p/C.scala"]);
        let extensions = LanguageExtensions::new(".kt", ".java");
        let split = partition(&sources, CompileOrder::PrimaryThenSecondary, &extensions);

        assert_eq!(split.primary, set(&["/p/A.kt"]));
        assert_eq!(split.secondary, set(&["/p/B.java"]));
    }

    fn file_name() -> impl Strategy<Value = String> {
        let ext = prop_oneof![
            Just(".scala"),
            Just(".java"),
            Just(".txt"),
            Just(".javax"),
            Just(""),
        ];
        ("[A-Za-z]{1,5}", ext).prop_map(|(stem, ext)| format!("{}{}", stem, ext))
    }

    fn source_set() -> impl Strategy<Value = SourceSet> {
        prop::collection::vec(file_name(), 0..12)
            .prop_map(|names| names.iter().map(|n| format!("/proj/src/{}", n)).collect())
    }

    proptest! {
        #[test]
        fn prop_mixed_primary_is_unfiltered(sources in source_set()) {
            let split = partition(&sources, CompileOrder::Mixed, &LanguageExtensions::default());
            prop_assert_eq!(split.primary, sources);
        }

        #[test]
        fn prop_ordered_partitions_are_disjoint_and_typed(
            sources in source_set(),
            secondary_first in any::<bool>(),
        ) {
            let order = if secondary_first {
                CompileOrder::SecondaryThenPrimary
            } else {
                CompileOrder::PrimaryThenSecondary
            };
            let split = partition(&sources, order, &LanguageExtensions::default());

            for path in &split.secondary {
                prop_assert!(has_suffix(path, ".java"));
                prop_assert!(!split.primary.contains(path));
            }
            for path in &split.primary {
                prop_assert!(has_suffix(path, ".scala"));
            }
            prop_assert!(split.primary.len() + split.secondary.len() <= sources.len());
        }
    }
}
