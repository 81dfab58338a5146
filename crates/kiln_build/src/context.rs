//! The immutable inputs of one build run.
//!
//! [`BuildContext`] bundles the project layout, the resolved flag profile,
//! the toolchain description and the derived include/library flags. It is
//! built once before any step runs and passed by reference to every step.

use std::path::{Path, PathBuf};

use kiln_config::{split_flags, BuildSettings, ProjectConfig, ToolchainConfig};
use walkdir::WalkDir;

use crate::error::BuildError;

/// Project directories, relative to the project root.
///
/// Tools run with the root as working directory, so these relative paths are
/// what appears on command lines. Filesystem checks go through [`abs`].
///
/// [`abs`]: ProjectLayout::abs
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Absolute project root.
    pub root: PathBuf,
    /// Source tree.
    pub src: PathBuf,
    /// Public include directory.
    pub inc: PathBuf,
    /// External library directory.
    pub lib: PathBuf,
    /// Object artifact directory.
    pub obj: PathBuf,
    /// Binary output directory.
    pub bin: PathBuf,
    lib_folder: String,
}

impl ProjectLayout {
    /// Builds the layout described by `config` below `root`.
    pub fn new(root: &Path, config: &ProjectConfig) -> Self {
        let layout = &config.layout;
        Self {
            root: root.to_path_buf(),
            src: PathBuf::from(&layout.src),
            inc: PathBuf::from(&layout.inc),
            lib: PathBuf::from(&layout.lib),
            obj: PathBuf::from(&layout.obj),
            bin: PathBuf::from(&layout.bin),
            lib_folder: layout.lib_folder.clone(),
        }
    }

    /// Resolves a root-relative path against the project root.
    pub fn abs(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Root of the published include tree (`bin/inc`).
    ///
    /// Rewritten includes are relative to this directory.
    pub fn include_root(&self) -> PathBuf {
        self.bin.join("inc")
    }

    /// Directory published headers are copied into (`bin/inc/<lib_folder>`).
    pub fn publish_dir(&self) -> PathBuf {
        self.with_lib_folder(self.include_root())
    }

    /// Directory static archives are written to (`bin/lib/<lib_folder>`).
    pub fn archive_dir(&self) -> PathBuf {
        self.with_lib_folder(self.bin.join("lib"))
    }

    fn with_lib_folder(&self, base: PathBuf) -> PathBuf {
        if self.lib_folder.is_empty() {
            base
        } else {
            base.join(&self.lib_folder)
        }
    }
}

/// Everything a build step needs to know, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Project directories.
    pub layout: ProjectLayout,
    /// Selected flag profile and platform link flags.
    pub settings: BuildSettings,
    /// Compiler, archiver and file extensions.
    pub toolchain: ToolchainConfig,
    /// Base name of the produced executable or archive.
    pub output_name: String,
    /// `-I` flags for the project plus configured extras.
    pub include_flags: Vec<String>,
    /// `-L` flags for every library directory plus configured extras.
    pub library_flags: Vec<String>,
}

impl BuildContext {
    /// Derives the build context for the project at `root`.
    ///
    /// Walks the library directory to collect `-L` search paths.
    pub fn new(
        root: &Path,
        config: &ProjectConfig,
        settings: BuildSettings,
    ) -> Result<Self, BuildError> {
        let layout = ProjectLayout::new(root, config);

        let mut include_flags = vec![
            format!("-I{}", layout.inc.display()),
            format!("-I{}", layout.src.display()),
        ];
        include_flags.extend(split_flags(&config.flags.includes));

        let mut library_flags = library_search_paths(&layout)?
            .iter()
            .map(|dir| format!("-L{}", dir.display()))
            .collect::<Vec<_>>();
        library_flags.extend(split_flags(&config.flags.libs));

        Ok(Self {
            layout,
            settings,
            toolchain: config.toolchain.clone(),
            output_name: config.project.name.clone(),
            include_flags,
            library_flags,
        })
    }

    /// Path of the linked executable, e.g. `bin/a.out`.
    pub fn executable_path(&self) -> PathBuf {
        let suffix = self.settings.platform.executable_suffix();
        self.layout
            .bin
            .join(format!("{}{suffix}", self.output_name))
    }

    /// Path of the static archive, e.g. `bin/lib/libtoolkit.a`.
    pub fn archive_path(&self) -> PathBuf {
        self.layout.archive_dir().join(format!(
            "lib{}.{}",
            self.output_name, self.toolchain.archive_ext
        ))
    }
}

/// Lists the library directory and all of its subdirectories, sorted.
///
/// Returns root-relative paths. A missing library directory yields nothing.
fn library_search_paths(layout: &ProjectLayout) -> Result<Vec<PathBuf>, BuildError> {
    let lib_dir = layout.abs(&layout.lib);
    if !lib_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(&lib_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(lib_dir.as_path()).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        if entry.file_type().is_dir() {
            let rel = entry
                .path()
                .strip_prefix(&layout.root)
                .unwrap_or(entry.path());
            dirs.push(rel.to_path_buf());
        }
    }
    Ok(dirs)
}
