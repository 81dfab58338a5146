//! `kiln clean`: remove build artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kiln_build::{BuildContext, BuildError};
use kiln_config::{resolve_settings, Platform};
use walkdir::WalkDir;

use crate::project::{ensure_layout, load_project};
use crate::GlobalArgs;

/// Runs the `kiln clean` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    ensure_layout(&project.root, &project.config)?;
    let settings = resolve_settings(&project.config, None, Platform::current())?;
    let ctx = BuildContext::new(&project.root, &project.config, settings)?;

    if !global.quiet {
        eprintln!("Removing temporary files...");
    }
    for removed in clean(&ctx)? {
        if !global.quiet {
            println!("- {}", removed.display());
        }
    }
    if !global.quiet {
        eprintln!("Temporary files removed!");
    }
    Ok(0)
}

/// Deletes object files, the executable, the archive and the published
/// `bin/inc` and `bin/lib` trees.
///
/// Returns the removed paths, relative to the project root. Anything that does
/// not exist is silently skipped.
pub fn clean(ctx: &BuildContext) -> Result<Vec<PathBuf>, BuildError> {
    let layout = &ctx.layout;
    let mut removed = Vec::new();

    let obj_dir = layout.abs(&layout.obj);
    for entry in WalkDir::new(&obj_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => continue,
            Err(e) => return Err(BuildError::io(&obj_dir, e.into())),
        };
        let path = entry.path();
        let is_object =
            path.extension().and_then(|e| e.to_str()) == Some(ctx.toolchain.object_ext.as_str());
        if entry.file_type().is_file() && is_object {
            fs::remove_file(path).map_err(|e| BuildError::io(path, e))?;
            if let Ok(rel) = path.strip_prefix(&layout.root) {
                removed.push(rel.to_path_buf());
            }
        }
    }

    for file in [ctx.executable_path(), ctx.archive_path()] {
        if remove(&layout.abs(&file), |p| fs::remove_file(p))? {
            removed.push(file);
        }
    }
    for dir in [layout.include_root(), layout.bin.join("lib")] {
        if remove(&layout.abs(&dir), |p| fs::remove_dir_all(p))? {
            removed.push(dir);
        }
    }

    tracing::debug!(count = removed.len(), "cleaned build artifacts");
    Ok(removed)
}

/// Applies `op` to `path`, treating a missing path as nothing to do.
fn remove(path: &Path, op: fn(&Path) -> io::Result<()>) -> Result<bool, BuildError> {
    match op(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::io(path, e)),
    }
}
