//! Configuration types deserialized from `kiln.toml`.
//!
//! Every section is optional. A project without a `kiln.toml` builds with
//! [`ProjectConfig::default`], which mirrors the conventional
//! `src`/`inc`/`lib`/`obj`/`bin` layout and a clang toolchain.

use serde::Deserialize;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata (output name).
    #[serde(default)]
    pub project: ProjectMeta,
    /// Directory names of the on-disk layout.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// External compiler and archiver, plus file extensions.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Flags applied to every profile.
    #[serde(default)]
    pub flags: FlagsConfig,
    /// Ordered table of named flag profiles. The first entry is the default.
    #[serde(default = "default_profiles", rename = "profile")]
    pub profiles: Vec<Profile>,
    /// Platform-dependent link flags.
    #[serde(default)]
    pub link: LinkConfig,
    /// Scheduler settings.
    #[serde(default)]
    pub build: BuildConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project: ProjectMeta::default(),
            layout: LayoutConfig::default(),
            toolchain: ToolchainConfig::default(),
            flags: FlagsConfig::default(),
            profiles: default_profiles(),
            link: LinkConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

/// Project metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    /// Base name of the produced executable or archive.
    pub name: String,
}

impl Default for ProjectMeta {
    fn default() -> Self {
        Self {
            name: "a".to_string(),
        }
    }
}

/// Names of the fixed project directories, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Source tree scanned for compilation units and published headers.
    pub src: String,
    /// Public include directory passed to the compiler.
    pub inc: String,
    /// External libraries; every subdirectory becomes a `-L` search path.
    pub lib: String,
    /// Object artifact directory.
    pub obj: String,
    /// Binary output directory.
    pub bin: String,
    /// Sub-folder of `bin/inc` and `bin/lib` used for library builds.
    pub lib_folder: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            src: "src".to_string(),
            inc: "inc".to_string(),
            lib: "lib".to_string(),
            obj: "obj".to_string(),
            bin: "bin".to_string(),
            lib_folder: String::new(),
        }
    }
}

/// External tools and the file extensions they consume and produce.
///
/// Extensions are written without the leading dot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Compiler driver, also used for dependency scanning and linking.
    pub cc: String,
    /// Static archiver.
    pub ar: String,
    /// Extension of compilable source files.
    pub source_ext: String,
    /// Extension of header files.
    pub header_ext: String,
    /// Extension of object artifacts.
    pub object_ext: String,
    /// Extension of static archives.
    pub archive_ext: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cc: "clang".to_string(),
            ar: "ar".to_string(),
            source_ext: "c".to_string(),
            header_ext: "h".to_string(),
            object_ext: "o".to_string(),
            archive_ext: "a".to_string(),
        }
    }
}

/// Whitespace-separated flag strings shared by all profiles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Compiler flags prepended to every profile's flags.
    pub common: String,
    /// Extra include flags appended after the project's own `-I` paths.
    pub includes: String,
    /// Extra library flags appended after the discovered `-L` paths.
    pub libs: String,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            common: "-Wall -Wno-unused-function -std=c17".to_string(),
            includes: String::new(),
            libs: String::new(),
        }
    }
}

/// A named compiler flag profile such as `debug` or `release`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Profile name used for selection on the command line.
    pub name: String,
    /// Whitespace-separated compiler flags.
    #[serde(default)]
    pub flags: String,
}

/// Returns the built-in `debug` and `release` profiles, `debug` first.
pub fn default_profiles() -> Vec<Profile> {
    vec![
        Profile {
            name: "debug".to_string(),
            flags: "-O0 -g -DDEBUG -fsanitize=address".to_string(),
        },
        Profile {
            name: "release".to_string(),
            flags: "-O3 -DNDEBUG".to_string(),
        },
    ]
}

/// Link flags split into a common part and two platform buckets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Flags passed on every platform.
    pub all: String,
    /// Flags added on Windows.
    pub windows: String,
    /// Flags added on every other platform.
    pub other: String,
}

/// Compilation scheduler settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Worker count for parallel builds. `0` uses the available parallelism.
    pub jobs: usize,
}
