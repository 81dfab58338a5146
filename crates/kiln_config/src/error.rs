//! Errors raised while reading, validating or resolving `kiln.toml`.

use std::path::PathBuf;

/// Why a project configuration cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `kiln.toml` exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("invalid kiln.toml: {0}")]
    Parse(String),

    /// A field that names a path, tool or extension is empty.
    #[error("`{0}` must not be empty")]
    EmptyField(String),

    /// Sources and headers would be indistinguishable.
    #[error("source and header extensions must differ (both are '{0}')")]
    ExtensionClash(String),

    /// The `[[profile]]` table is empty.
    #[error("at least one [[profile]] is required")]
    NoProfiles,

    /// Two profiles share a name, so `--profile` would be ambiguous.
    #[error("profile '{0}' is defined more than once")]
    DuplicateProfile(String),

    /// `--profile` named a profile the project does not define.
    #[error("unknown profile '{name}' (available: {available})")]
    UnknownProfile {
        /// The requested name.
        name: String,
        /// Comma-separated names of the configured profiles.
        available: String,
    },
}
