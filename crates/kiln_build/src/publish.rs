//! Header publishing for library builds.
//!
//! Every header in the source tree is copied into `bin/inc/<lib_folder>`,
//! keeping its relative position. Quoted includes inside the copies are
//! rewritten so they resolve against `bin/inc` alone, which is the only
//! directory a consumer of the library puts on its include path.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::context::{BuildContext, ProjectLayout};
use crate::discover::find_files;
use crate::error::BuildError;
use crate::freshness::is_stale;
use crate::paths::{normalize, relative_path, to_slash};

/// A replacement of `range` in a file's text.
type Edit = (Range<usize>, String);

fn include_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"#include\s*"([^"]*)""#).expect("include pattern is a valid regex")
    })
}

/// Publishes the project's headers and returns the ones copied this run.
///
/// Headers whose published copy is newer than the original are left alone,
/// including their includes. Returned paths are relative to the project root.
pub fn publish_headers(ctx: &BuildContext) -> Result<Vec<PathBuf>, BuildError> {
    let layout = &ctx.layout;
    let publish_dir = layout.publish_dir();

    let mut copied = Vec::new();
    for rel in find_files(layout, &layout.src, &ctx.toolchain.header_ext)? {
        let original = layout.src.join(&rel);
        let published = publish_dir.join(&rel);
        let target = layout.abs(&published);
        if !is_stale(&target, &[layout.abs(&original)]) {
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        fs::copy(layout.abs(&original), &target).map_err(|e| BuildError::io(&target, e))?;
        tracing::debug!(header = %published.display(), "copied header");
        copied.push((original, published));
    }

    for (original, published) in &copied {
        rewrite_includes(layout, &ctx.toolchain.header_ext, original, published)?;
    }

    tracing::info!(count = copied.len(), dir = %publish_dir.display(), "published headers");
    Ok(copied.into_iter().map(|(_, published)| published).collect())
}

/// Rewrites the quoted includes of one freshly published header in place.
fn rewrite_includes(
    layout: &ProjectLayout,
    header_ext: &str,
    original: &Path,
    published: &Path,
) -> Result<(), BuildError> {
    let path = layout.abs(published);
    let text = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;

    let mut edits: Vec<Edit> = Vec::new();
    for cap in include_pattern().captures_iter(&text) {
        let Some(include) = cap.get(1) else { continue };
        let target = resolve_include(layout, header_ext, original, include.as_str())
            .ok_or_else(|| BuildError::UnresolvableInclude {
                header: published.to_path_buf(),
                include: include.as_str().to_string(),
            })?;
        let replacement = relative_path(&layout.abs(&layout.include_root()), &layout.abs(&target))
            .map(|rel| to_slash(&rel))
            .ok_or_else(|| BuildError::UnresolvableInclude {
                header: published.to_path_buf(),
                include: include.as_str().to_string(),
            })?;
        if replacement != include.as_str() {
            edits.push((include.range(), replacement));
        }
    }

    if edits.is_empty() {
        return Ok(());
    }
    tracing::trace!(header = %published.display(), edits = edits.len(), "rewriting includes");
    fs::write(&path, apply_edits(&text, &edits)).map_err(|e| BuildError::io(&path, e))
}

/// Finds what an include written in `original` refers to, root-relative.
///
/// Looks next to the original header first. A header inside the source tree
/// is redirected to its published copy; any other hit (outside the source
/// tree, or a file that is never published) keeps its real location. Failing
/// that, the include is tried against the publish directory.
fn resolve_include(
    layout: &ProjectLayout,
    header_ext: &str,
    original: &Path,
    include: &str,
) -> Option<PathBuf> {
    let dir = original.parent().unwrap_or(Path::new(""));
    let beside = normalize(&dir.join(include));
    if layout.abs(&beside).is_file() {
        let is_header = beside.extension().and_then(|e| e.to_str()) == Some(header_ext);
        return Some(match beside.strip_prefix(&layout.src) {
            Ok(rel) if is_header => layout.publish_dir().join(rel),
            _ => beside,
        });
    }

    let published = normalize(&layout.publish_dir().join(include));
    layout.abs(&published).is_file().then_some(published)
}

/// Applies non-overlapping edits, given in ascending order, in one pass.
fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&text[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
