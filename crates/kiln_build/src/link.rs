//! Final artifacts: linking an executable or archiving a static library.
//!
//! Both steps only compare against the object files. Objects were already
//! checked against their headers, so they stand in for the whole tree.

use std::path::{Path, PathBuf};

use crate::context::BuildContext;
use crate::discover::CompilationUnit;
use crate::error::BuildError;
use crate::freshness::is_stale;
use crate::report::{ArtifactOutcome, OutputReport};
use crate::toolchain::{OutputMode, ToolCommand, Toolchain};

/// Links all object files into the project executable.
///
/// Runs `<cc> -o <output> <objects> <cflags> <library-paths> <ldflags>` when
/// the executable is missing or older than any object.
pub fn link_executable(
    toolchain: &Toolchain<'_>,
    ctx: &BuildContext,
    units: &[CompilationUnit],
    cflags: &[String],
) -> Result<OutputReport, BuildError> {
    let output = ctx.executable_path();
    if !needs_rebuild(ctx, &output, units)? {
        return Ok(up_to_date(output));
    }

    let command = ToolCommand::new(&ctx.toolchain.cc)
        .arg("-o")
        .path_arg(&output)
        .args(object_args(units))
        .args(cflags.iter().cloned())
        .args(ctx.library_flags.iter().cloned())
        .args(ctx.settings.ldflags.iter().cloned());
    toolchain.execute(&command, OutputMode::Inherit)?;

    Ok(OutputReport {
        path: output,
        outcome: ArtifactOutcome::Built,
    })
}

/// Archives all object files into the project's static library.
///
/// Runs `<ar> rcs <archive> <objects>` when the archive is missing or older
/// than any object. The archive directory is created as needed.
pub fn archive_library(
    toolchain: &Toolchain<'_>,
    ctx: &BuildContext,
    units: &[CompilationUnit],
) -> Result<OutputReport, BuildError> {
    let output = ctx.archive_path();
    if !needs_rebuild(ctx, &output, units)? {
        return Ok(up_to_date(output));
    }

    let command = ToolCommand::new(&ctx.toolchain.ar)
        .arg("rcs")
        .path_arg(&output)
        .args(object_args(units));
    toolchain.execute(&command, OutputMode::Inherit)?;

    Ok(OutputReport {
        path: output,
        outcome: ArtifactOutcome::Built,
    })
}

/// Checks staleness and, if a rebuild is due, makes sure the output
/// directory exists.
fn needs_rebuild(
    ctx: &BuildContext,
    output: &Path,
    units: &[CompilationUnit],
) -> Result<bool, BuildError> {
    let target = ctx.layout.abs(output);
    let objects: Vec<PathBuf> = units.iter().map(|u| ctx.layout.abs(&u.object)).collect();
    if !is_stale(&target, &objects) {
        tracing::debug!(output = %output.display(), "output is up to date");
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    Ok(true)
}

fn object_args(units: &[CompilationUnit]) -> impl Iterator<Item = String> + '_ {
    units.iter().map(|u| u.object.display().to_string())
}

fn up_to_date(path: PathBuf) -> OutputReport {
    OutputReport {
        path,
        outcome: ArtifactOutcome::UpToDate,
    }
}
