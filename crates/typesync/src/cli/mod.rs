//! CLI module for Typesync

pub mod convert;
pub mod resolve;
pub mod sync;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use typesync_schema::{load_config, TypesyncConfig};

/// Load config from `path`, or from `<home>/config.toml` when not given.
pub fn load_typesync_config(path: Option<&Path>) -> Result<TypesyncConfig> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => typesync_logging::typesync_home()?.join("config.toml"),
    };
    load_config(&path).with_context(|| format!("Failed to load config: {}", path.display()))
}
