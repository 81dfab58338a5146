//! Profile resolution: folding the selected flag profile and the platform
//! link flags into one immutable [`BuildSettings`].

use crate::error::ConfigError;
use crate::types::ProjectConfig;

/// The two link-flag buckets a project can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows hosts.
    Windows,
    /// Every other host.
    Other,
}

impl Platform {
    /// Returns the platform kiln is running on.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }

    /// File suffix of linked executables on this platform.
    pub fn executable_suffix(self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            Platform::Other => ".out",
        }
    }
}

/// Compiler and linker flags selected for one build run.
///
/// Produced once at startup and passed by reference into every build step;
/// nothing in the engine reads flags from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Name of the selected profile.
    pub profile: String,
    /// Common compiler flags followed by the profile's flags.
    pub cflags: Vec<String>,
    /// Common link flags followed by the platform bucket's flags.
    pub ldflags: Vec<String>,
    /// Platform the link flags were chosen for.
    pub platform: Platform,
}

/// Resolves the build settings for a run.
///
/// `profile` selects a profile by name; `None` picks the first profile in the
/// table.
pub fn resolve_settings(
    config: &ProjectConfig,
    profile: Option<&str>,
    platform: Platform,
) -> Result<BuildSettings, ConfigError> {
    let selected = match profile {
        Some(name) => config
            .profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: config
                    .profiles
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?,
        None => config.profiles.first().ok_or(ConfigError::NoProfiles)?,
    };

    let mut cflags = split_flags(&config.flags.common);
    cflags.extend(split_flags(&selected.flags));

    let mut ldflags = split_flags(&config.link.all);
    ldflags.extend(split_flags(match platform {
        Platform::Windows => &config.link.windows,
        Platform::Other => &config.link.other,
    }));

    Ok(BuildSettings {
        profile: selected.name.clone(),
        cflags,
        ldflags,
        platform,
    })
}

/// Splits a whitespace-separated flag string into individual arguments.
pub fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}
