//! `kiln init`: write a commented `kiln.toml` template.

use std::fs;
use std::path::{Path, PathBuf};

use kiln_config::CONFIG_FILE_NAME;

use crate::GlobalArgs;

/// Runs the `kiln init` command in the current directory, or at the location
/// given with `--config`.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let path = match global.config {
        Some(ref target) => config_path(Path::new(target)),
        None => std::env::current_dir()?.join(CONFIG_FILE_NAME),
    };
    init(&path)?;
    if !global.quiet {
        eprintln!("     Created {}", path.display());
    }
    Ok(0)
}

/// Maps a `--config` argument to the file to create.
///
/// Like `kiln build --config`, the argument may name the file itself or the
/// project directory. A not-yet-existing path ending in `.toml` is a file.
fn config_path(target: &Path) -> PathBuf {
    let names_file = target.is_file()
        || (!target.is_dir() && target.extension().and_then(|e| e.to_str()) == Some("toml"));
    if names_file {
        target.to_path_buf()
    } else {
        target.join(CONFIG_FILE_NAME)
    }
}

/// Writes the template to `path`, creating its directory.
///
/// The project is named after that directory. Refuses to overwrite an
/// existing configuration.
pub fn init(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("a");
    fs::create_dir_all(&dir)?;
    fs::write(path, template(name))?;
    Ok(())
}

fn template(name: &str) -> String {
    format!(
        r#"[project]
# Base name of the executable (bin/<name>.out) or archive (lib<name>.a).
name = "{name}"

[layout]
src = "src"
inc = "inc"
lib = "lib"
obj = "obj"
bin = "bin"
# Sub-folder for published headers and archives in library builds.
lib_folder = ""

[toolchain]
cc = "clang"
ar = "ar"

[flags]
common = "-Wall -Wno-unused-function -std=c17"
includes = ""
libs = ""

# The first profile is used unless `--profile` selects another.
[[profile]]
name = "debug"
flags = "-O0 -g -DDEBUG -fsanitize=address"

[[profile]]
name = "release"
flags = "-O3 -DNDEBUG"

[link]
all = ""
windows = ""
other = ""

[build]
# Workers for `kiln build --fast`; 0 uses every available core.
jobs = 0
"#
    )
}
