//! Locating the project and preparing its directory layout.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use kiln_config::{load_config, load_config_from_str, ProjectConfig, CONFIG_FILE_NAME};

use crate::GlobalArgs;

/// A located project: its root directory and parsed configuration.
pub struct Project {
    /// Directory all layout paths are relative to.
    pub root: PathBuf,
    /// Contents of `kiln.toml`, or the defaults if there is none.
    pub config: ProjectConfig,
}

/// Walks up from `start` looking for the nearest directory with a `kiln.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}

/// Resolves and loads the project selected by the global CLI args.
///
/// `--config` may name a config file (its directory becomes the root) or a
/// project directory. Without it the nearest enclosing project is used, and a
/// directory without any `kiln.toml` is built with default settings.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let path = PathBuf::from(config_path);
        if path.is_file() {
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let config = load_config_from_str(&fs::read_to_string(&path)?)?;
            return Ok(Project { root, config });
        }
        let config = load_config(&path)?;
        return Ok(Project { root: path, config });
    }

    let cwd = std::env::current_dir()?;
    let root = find_project_root(&cwd).unwrap_or(cwd);
    tracing::debug!(root = %root.display(), "using project root");
    let config = load_config(&root)?;
    Ok(Project { root, config })
}

/// Creates the standard directories and ignore file if they are missing.
///
/// Every directory except the source tree gets an empty `.gitkeep`.
pub fn ensure_layout(root: &Path, config: &ProjectConfig) -> io::Result<()> {
    let layout = &config.layout;
    fs::create_dir_all(root.join(&layout.src))?;
    for dir in [&layout.lib, &layout.inc, &layout.obj, &layout.bin] {
        let dir = root.join(dir);
        fs::create_dir_all(&dir)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(".gitkeep"))?;
    }

    let gitignore = root.join(".gitignore");
    if !gitignore.exists() {
        fs::write(gitignore, "*.o\n*.exe\nbin/*")?;
    }
    Ok(())
}
