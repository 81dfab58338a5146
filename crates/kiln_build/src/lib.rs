//! Incremental build engine for single-project C builds.
//!
//! The engine discovers compilation units, asks the compiler for each unit's
//! header closure, recompiles only the units whose object file is older than
//! any of its inputs, and finally links an executable or archives a static
//! library. Library builds also publish the project's headers with their
//! quoted includes rewritten for the distribution tree.
//!
//! All external tools are reached through the [`CommandRunner`] trait so the
//! scheduling logic can be exercised without a real compiler.

#![warn(missing_docs)]

pub mod context;
pub mod depscan;
pub mod discover;
pub mod error;
pub mod freshness;
pub mod link;
pub mod paths;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod scheduler;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{BuildContext, ProjectLayout};
pub use depscan::{extract_dependencies, parse_dependency_rule, DependencySet};
pub use discover::{discover_units, CompilationUnit};
pub use error::{BuildError, UnitFailure};
pub use freshness::is_stale;
pub use link::{archive_library, link_executable};
pub use pipeline::{build, BuildOptions, OutputKind};
pub use publish::publish_headers;
pub use report::{ArtifactOutcome, BuildReport, OutputReport, UnitOutcome, UnitReport};
pub use scheduler::{compile_units, ScheduleMode, UnitState};
pub use toolchain::{CommandRunner, OutputMode, ProcessRunner, ToolCommand, ToolOutput, Toolchain};
