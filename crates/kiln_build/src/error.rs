//! Error types for the build engine.
//!
//! Every error is fatal to the run. Sequential builds return the first error
//! they hit; parallel builds finish in-flight units and then report all
//! failures together as [`BuildError::UnitsFailed`].

use std::fmt;
use std::path::PathBuf;

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// An external tool (compiler, linker, archiver) exited unsuccessfully.
    #[error("`{command}` failed with {status}")]
    ToolInvocation {
        /// The full command line, as echoed before running it.
        command: String,
        /// Human-readable exit status (`exit code 1`, `termination by signal`).
        status: String,
        /// Captured diagnostics, empty when output went to the terminal.
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("failed to start `{program}`: {source}")]
    ToolSpawn {
        /// The program that was invoked.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler's dependency scan produced output that is not a make rule.
    #[error("malformed dependency output for {file}: {reason}")]
    DependencyParse {
        /// The source file that was scanned.
        file: PathBuf,
        /// What was wrong with the output.
        reason: String,
    },

    /// A quoted include in a published header resolves to no existing file.
    #[error("unresolvable include \"{include}\" in {header}")]
    UnresolvableInclude {
        /// The published header containing the include.
        header: PathBuf,
        /// The include path as written.
        include: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The source tree contains no compilation units.
    #[error("no source files found in {0}")]
    NoSources(PathBuf),

    /// One or more units failed during a parallel build.
    #[error("{} compilation unit(s) failed", .0.len())]
    UnitsFailed(Vec<UnitFailure>),

    /// The parallel worker pool could not be created.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The built program could not be started.
    #[error("failed to run {path}: {source}")]
    ProgramSpawn {
        /// The executable that was invoked.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl BuildError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

/// One failed unit of a parallel build.
#[derive(Debug)]
pub struct UnitFailure {
    /// Source file of the failing unit.
    pub source_file: PathBuf,
    /// Why it failed.
    pub error: BuildError,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source_file.display(), self.error)
    }
}
