//! Compilation scheduling.
//!
//! Every unit walks the same state machine:
//!
//! ```text
//! Pending -> DependencyResolved -> Skipped
//!                               -> Compiling -> Compiled
//!                                            -> Failed
//! Pending -> Cancelled            (parallel builds only)
//! ```
//!
//! A unit is skipped when its object file is fresh relative to its full
//! dependency set. Sequential builds stop at the first failure. Parallel
//! builds run on a bounded rayon pool; the first failure raises a shared
//! cancellation flag so units that have not started yet are never compiled,
//! and all failures are reported together after the join.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::context::BuildContext;
use crate::depscan::extract_dependencies;
use crate::discover::CompilationUnit;
use crate::error::{BuildError, UnitFailure};
use crate::freshness::is_stale;
use crate::report::{UnitOutcome, UnitReport};
use crate::toolchain::{OutputMode, ToolCommand, Toolchain};

/// How units are dispatched, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// One unit at a time, compiler output visible.
    Sequential,
    /// Concurrent units on a pool of `jobs` workers (`0` = available
    /// parallelism). Compiler warnings are disabled and output captured.
    Parallel {
        /// Worker count.
        jobs: usize,
    },
}

impl ScheduleMode {
    /// Short name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            ScheduleMode::Sequential => "sequential",
            ScheduleMode::Parallel { .. } => "parallel",
        }
    }

    /// Compiler flags for this mode: the profile flags, plus `-w` in
    /// parallel mode.
    pub fn compile_flags(self, ctx: &BuildContext) -> Vec<String> {
        let mut flags = ctx.settings.cflags.clone();
        if let ScheduleMode::Parallel { .. } = self {
            flags.push("-w".to_string());
        }
        flags
    }
}

/// Lifecycle state of one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Not looked at yet.
    Pending,
    /// The dependency scan succeeded.
    DependencyResolved,
    /// The object file is fresh.
    Skipped,
    /// The compiler is running.
    Compiling,
    /// The compiler succeeded.
    Compiled,
    /// The dependency scan or the compiler failed.
    Failed,
    /// Never started because the build was already failing.
    Cancelled,
}

impl UnitState {
    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: UnitState) -> bool {
        use UnitState::*;
        matches!(
            (self, next),
            (Pending, DependencyResolved)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (DependencyResolved, Skipped)
                | (DependencyResolved, Compiling)
                | (DependencyResolved, Failed)
                | (Compiling, Compiled)
                | (Compiling, Failed)
        )
    }

    /// Returns `true` for states a unit never leaves.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UnitState::Skipped | UnitState::Compiled | UnitState::Failed | UnitState::Cancelled
        )
    }
}

/// Tracks one unit through its state machine, logging each transition.
struct UnitTracker<'u> {
    unit: &'u CompilationUnit,
    state: UnitState,
}

impl<'u> UnitTracker<'u> {
    fn new(unit: &'u CompilationUnit) -> Self {
        Self {
            unit,
            state: UnitState::Pending,
        }
    }

    fn advance(&mut self, next: UnitState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal unit transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(
            source = %self.unit.source.display(),
            from = ?self.state,
            to = ?next,
            "unit transition"
        );
        self.state = next;
    }

    fn fail(&mut self, error: BuildError) -> BuildError {
        self.advance(UnitState::Failed);
        error
    }
}

/// Brings every unit's object file up to date.
///
/// Returns one report per unit in input order. Sequential mode returns the
/// first error; parallel mode returns [`BuildError::UnitsFailed`] with every
/// failure once all started units have finished.
pub fn compile_units(
    toolchain: &Toolchain<'_>,
    ctx: &BuildContext,
    units: &[CompilationUnit],
    mode: ScheduleMode,
) -> Result<Vec<UnitReport>, BuildError> {
    let cflags = mode.compile_flags(ctx);
    match mode {
        ScheduleMode::Sequential => units
            .iter()
            .map(|unit| {
                let outcome = process_unit(toolchain, ctx, unit, &cflags, OutputMode::Inherit)?;
                Ok(report(unit, outcome))
            })
            .collect(),
        ScheduleMode::Parallel { jobs } => compile_parallel(toolchain, ctx, units, &cflags, jobs),
    }
}

fn compile_parallel(
    toolchain: &Toolchain<'_>,
    ctx: &BuildContext,
    units: &[CompilationUnit],
    cflags: &[String],
    jobs: usize,
) -> Result<Vec<UnitReport>, BuildError> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    tracing::debug!(workers = pool.current_num_threads(), units = units.len(), "parallel compile");

    let cancelled = AtomicBool::new(false);
    let results: Vec<Result<UnitOutcome, BuildError>> = pool.install(|| {
        units
            .par_iter()
            .map(|unit| {
                if cancelled.load(Ordering::Acquire) {
                    UnitTracker::new(unit).advance(UnitState::Cancelled);
                    return Ok(UnitOutcome::Cancelled);
                }
                let result = process_unit(toolchain, ctx, unit, cflags, OutputMode::Capture);
                if result.is_err() {
                    cancelled.store(true, Ordering::Release);
                }
                result
            })
            .collect()
    });

    let mut reports = Vec::with_capacity(units.len());
    let mut failures = Vec::new();
    for (unit, result) in units.iter().zip(results) {
        match result {
            Ok(outcome) => reports.push(report(unit, outcome)),
            Err(error) => failures.push(UnitFailure {
                source_file: unit.source.clone(),
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(reports)
    } else {
        Err(BuildError::UnitsFailed(failures))
    }
}

/// Runs one unit from `Pending` to a terminal state.
fn process_unit(
    toolchain: &Toolchain<'_>,
    ctx: &BuildContext,
    unit: &CompilationUnit,
    cflags: &[String],
    output: OutputMode,
) -> Result<UnitOutcome, BuildError> {
    let mut tracker = UnitTracker::new(unit);

    let deps = extract_dependencies(toolchain, ctx, unit, cflags).map_err(|e| tracker.fail(e))?;
    tracker.advance(UnitState::DependencyResolved);

    let layout = &ctx.layout;
    let object = layout.abs(&unit.object);
    let inputs: Vec<_> = deps.inputs().into_iter().map(|p| layout.abs(p)).collect();
    if !is_stale(&object, &inputs) {
        tracker.advance(UnitState::Skipped);
        tracing::debug!(source = %unit.source.display(), "object is up to date");
        return Ok(UnitOutcome::Skipped);
    }

    tracker.advance(UnitState::Compiling);
    if let Some(parent) = object.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| tracker.fail(BuildError::io(parent, e)))?;
    }

    let command = ToolCommand::new(&ctx.toolchain.cc)
        .arg("-c")
        .path_arg(&unit.source)
        .arg("-o")
        .path_arg(&unit.object)
        .args(cflags.iter().cloned())
        .args(ctx.include_flags.iter().cloned());
    toolchain
        .execute(&command, output)
        .map_err(|e| tracker.fail(e))?;

    tracker.advance(UnitState::Compiled);
    Ok(UnitOutcome::Compiled)
}

fn report(unit: &CompilationUnit, outcome: UnitOutcome) -> UnitReport {
    UnitReport {
        source: unit.source.clone(),
        object: unit.object.clone(),
        outcome,
    }
}
