//! `kiln run`: start the built executable.

use std::path::Path;
use std::process::Command;

use kiln_build::{BuildContext, BuildError};
use kiln_config::{resolve_settings, Platform};

use crate::project::load_project;
use crate::GlobalArgs;

/// Runs the `kiln run` command.
///
/// Does not build first. The program's exit code becomes kiln's exit code.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let settings = resolve_settings(&project.config, None, Platform::current())?;
    let ctx = BuildContext::new(&project.root, &project.config, settings)?;
    let executable = ctx.executable_path();

    if !global.quiet {
        eprintln!("Running program...");
        eprintln!("{}\n", executable.display());
    }
    let code = run_program(&project.root, &executable)?;
    if !global.quiet {
        eprintln!("\nProgram ended with exit code {code}");
    }
    Ok(code)
}

/// Runs `executable` (relative to `root`) with no arguments from `root`.
///
/// A program killed by a signal reports exit code 1.
pub fn run_program(root: &Path, executable: &Path) -> Result<i32, BuildError> {
    let path = root.join(executable);
    let status = Command::new(&path)
        .current_dir(root)
        .status()
        .map_err(|source| BuildError::ProgramSpawn {
            path: executable.to_path_buf(),
            source,
        })?;
    tracing::debug!(%status, "program finished");
    Ok(status.code().unwrap_or(1))
}
