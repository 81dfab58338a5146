//! The full build: discover, compile, then link or archive and publish.

use crate::context::BuildContext;
use crate::discover::discover_units;
use crate::error::BuildError;
use crate::link::{archive_library, link_executable};
use crate::publish::publish_headers;
use crate::report::{BuildReport, UnitOutcome};
use crate::scheduler::{compile_units, ScheduleMode};
use crate::toolchain::{CommandRunner, Toolchain};

/// What the build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// A linked executable in the binary directory.
    #[default]
    Executable,
    /// A static archive plus the published header tree.
    StaticLibrary,
}

/// Per-run choices that are not part of the project configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Sequential or parallel compilation.
    pub mode: ScheduleMode,
    /// Executable or static library.
    pub output: OutputKind,
    /// Print each tool command line before running it.
    pub echo: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::Sequential,
            output: OutputKind::Executable,
            echo: true,
        }
    }
}

/// Runs one complete build.
///
/// Fails with [`BuildError::NoSources`] when the source tree holds no
/// compilation units. No final artifact is produced unless every unit
/// compiled or was already up to date.
pub fn build(
    ctx: &BuildContext,
    options: &BuildOptions,
    runner: &dyn CommandRunner,
) -> Result<BuildReport, BuildError> {
    let toolchain = Toolchain::new(runner, options.echo);

    let units = discover_units(&ctx.layout, &ctx.toolchain)?;
    if units.is_empty() {
        return Err(BuildError::NoSources(ctx.layout.src.clone()));
    }

    tracing::info!(
        profile = %ctx.settings.profile,
        schedule = options.mode.name(),
        units = units.len(),
        "starting build"
    );
    let unit_reports = compile_units(&toolchain, ctx, &units, options.mode)?;

    let (output, published_headers) = match options.output {
        OutputKind::Executable => {
            let cflags = options.mode.compile_flags(ctx);
            (link_executable(&toolchain, ctx, &units, &cflags)?, Vec::new())
        }
        OutputKind::StaticLibrary => {
            let archive = archive_library(&toolchain, ctx, &units)?;
            (archive, publish_headers(ctx)?)
        }
    };

    let report = BuildReport {
        profile: ctx.settings.profile.clone(),
        schedule: options.mode.name(),
        units: unit_reports,
        output,
        published_headers,
    };
    tracing::info!(
        compiled = report.count(UnitOutcome::Compiled),
        skipped = report.count(UnitOutcome::Skipped),
        "build finished"
    );
    Ok(report)
}
