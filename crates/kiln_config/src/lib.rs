//! Parsing and validation of `kiln.toml` project configuration files.
//!
//! This crate reads the optional project configuration file and produces a
//! strongly-typed [`ProjectConfig`]. [`resolve_settings`] then folds the
//! selected flag profile and the platform link flags into an immutable
//! [`BuildSettings`] value that the build engine receives explicitly.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_settings, split_flags, BuildSettings, Platform};
pub use types::*;
