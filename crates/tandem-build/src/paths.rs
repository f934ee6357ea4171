//! Path helpers shared by source sets and the dependency relativizer

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding normal component. Never touches the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut normals = 0usize;

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normals > 0 {
                    out.pop();
                    normals -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
                // `..` at the root stays at the root
            }
            Component::Normal(name) => {
                out.push(name);
                normals += 1;
            }
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
        }
    }

    out
}

/// Make a path absolute against the current directory
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(dir) => dir.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Absolute canonical form of a path.
///
/// Existing paths are resolved through the filesystem (symlinks included);
/// paths that do not exist yet fall back to lexical normalization.
pub fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize(&absolute(path)))
}

/// Path of `path` relative to `base`, if `path` is an absolute path at or
/// under `base`. A path equal to `base` yields the empty path.
///
/// Relative paths are never considered under a base, so feeding a result
/// back in leaves it unchanged.
pub fn relativize(base: &Path, path: &Path) -> Option<PathBuf> {
    if !path.is_absolute() {
        return None;
    }
    normalize(path)
        .strip_prefix(base)
        .ok()
        .map(Path::to_path_buf)
}

/// Join paths with the platform path-list separator (`:` or `;`)
pub fn join_path_list<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    let separator = if cfg!(windows) { ";" } else { ":" };
    paths
        .into_iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
