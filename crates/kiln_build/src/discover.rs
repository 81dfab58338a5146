//! Source discovery: enumerating compilation units.

use std::path::{Path, PathBuf};

use kiln_config::ToolchainConfig;
use walkdir::WalkDir;

use crate::context::ProjectLayout;
use crate::error::BuildError;

/// One source file and the object file it compiles to.
///
/// Both paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// The source file, e.g. `src/net/socket.c`.
    pub source: PathBuf,
    /// The object artifact, e.g. `obj/net/socket.o`.
    pub object: PathBuf,
}

/// Discovers every compilable file under the source tree.
///
/// Each source maps to an object path that mirrors its position below the
/// source root, so `src/main.c` becomes `obj/main.o` and `src/net/util.c`
/// becomes `obj/net/util.o`. Same-named files in different directories
/// therefore never share an object file.
pub fn discover_units(
    layout: &ProjectLayout,
    toolchain: &ToolchainConfig,
) -> Result<Vec<CompilationUnit>, BuildError> {
    let units = find_files(layout, &layout.src, &toolchain.source_ext)?
        .into_iter()
        .map(|rel| CompilationUnit {
            source: layout.src.join(&rel),
            object: layout.obj.join(&rel).with_extension(&toolchain.object_ext),
        })
        .collect::<Vec<_>>();
    tracing::debug!(count = units.len(), "discovered compilation units");
    Ok(units)
}

/// Recursively lists files with extension `ext` below the root-relative
/// directory `dir`.
///
/// Returned paths are relative to `dir` and sorted by traversal (file name)
/// order. A missing directory yields an empty list.
pub(crate) fn find_files(
    layout: &ProjectLayout,
    dir: &Path,
    ext: &str,
) -> Result<Vec<PathBuf>, BuildError> {
    let base = layout.abs(dir);
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(base.as_path()).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext)
        {
            continue;
        }
        if let Ok(rel) = path.strip_prefix(&base) {
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}
