//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::HashSet;
use std::path::Path;

/// File name of the project configuration, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates the `kiln.toml` of a project directory.
///
/// A missing file is not an error: the project builds with
/// [`ProjectConfig::default`]. Any other read failure is reported.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    match std::fs::read_to_string(&config_path) {
        Ok(content) => load_config_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProjectConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: config_path,
            source,
        }),
    }
}

/// Parses and validates a `kiln.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::EmptyField("project.name".to_string()));
    }

    let layout = &config.layout;
    for (field, value) in [
        ("layout.src", &layout.src),
        ("layout.obj", &layout.obj),
        ("layout.bin", &layout.bin),
    ] {
        if value.is_empty() {
            return Err(ConfigError::EmptyField(field.to_string()));
        }
    }

    let tc = &config.toolchain;
    for (field, value) in [
        ("toolchain.cc", &tc.cc),
        ("toolchain.ar", &tc.ar),
        ("toolchain.source_ext", &tc.source_ext),
        ("toolchain.header_ext", &tc.header_ext),
        ("toolchain.object_ext", &tc.object_ext),
        ("toolchain.archive_ext", &tc.archive_ext),
    ] {
        if value.is_empty() {
            return Err(ConfigError::EmptyField(field.to_string()));
        }
    }
    if tc.source_ext == tc.header_ext {
        return Err(ConfigError::ExtensionClash(tc.source_ext.clone()));
    }

    if config.profiles.is_empty() {
        return Err(ConfigError::NoProfiles);
    }
    let mut seen = HashSet::new();
    for profile in &config.profiles {
        if profile.name.is_empty() {
            return Err(ConfigError::EmptyField("profile.name".to_string()));
        }
        if !seen.insert(profile.name.as_str()) {
            return Err(ConfigError::DuplicateProfile(profile.name.clone()));
        }
    }
    Ok(())
}
