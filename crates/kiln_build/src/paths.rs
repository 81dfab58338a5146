//! Lexical path helpers.
//!
//! These never touch the filesystem, so they work for paths that do not
//! exist yet (for example a header that is about to be published).

use std::path::{Component, Path, PathBuf};

/// Removes `.` components and folds `dir/..` pairs.
///
/// Leading `..` components of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Computes the path of `to` relative to the directory `from`.
///
/// Both paths are normalized first. Returns `None` when they have different
/// roots (one absolute and one relative, or different Windows prefixes).
pub fn relative_path(from: &Path, to: &Path) -> Option<PathBuf> {
    let from = normalize(from);
    let to = normalize(to);
    if from.has_root() != to.has_root() {
        return None;
    }

    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    if from.has_root() && common == 0 {
        return None;
    }
    if from_parts[common..]
        .iter()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }
    Some(rel)
}

/// Renders a relative path with `/` separators, as `#include` expects.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
