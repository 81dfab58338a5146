//! Serializable summary of a build run.

use std::path::PathBuf;

use serde::Serialize;

/// What happened to one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    /// The object file was rebuilt.
    Compiled,
    /// The object file was newer than every input.
    Skipped,
    /// The unit never started because another unit had already failed.
    Cancelled,
}

/// What happened to a final artifact (executable, archive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// The artifact was (re)built.
    Built,
    /// The artifact was newer than every object file.
    UpToDate,
}

/// Per-unit line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    /// Source file.
    pub source: PathBuf,
    /// Object file.
    pub object: PathBuf,
    /// Outcome of the unit.
    pub outcome: UnitOutcome,
}

/// The linked executable or the static archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputReport {
    /// Path of the artifact.
    pub path: PathBuf,
    /// Whether it was rebuilt.
    pub outcome: ArtifactOutcome,
}

/// Summary of a complete, successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Name of the flag profile used.
    pub profile: String,
    /// `sequential` or `parallel`.
    pub schedule: &'static str,
    /// One entry per compilation unit, in discovery order.
    pub units: Vec<UnitReport>,
    /// The final artifact.
    pub output: OutputReport,
    /// Headers copied into the include tree by this run (library builds).
    pub published_headers: Vec<PathBuf>,
}

impl BuildReport {
    /// Number of units with the given outcome.
    pub fn count(&self, outcome: UnitOutcome) -> usize {
        self.units.iter().filter(|u| u.outcome == outcome).count()
    }
}
