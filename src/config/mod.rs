//! Configuration module for nexus-search
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "NEXUS_SETTINGS_PATH";

/// Locate and load settings, falling back to defaults.
///
/// Environment overrides are applied and the result is validated before
/// it is returned.
pub fn load() -> Result<Settings> {
    load_from(locate().as_deref())
}

/// Load settings from `path` (defaults when `None`), apply environment
/// overrides and validate
pub fn load_from(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Settings::default(),
    };
    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}

/// First settings file that exists, checking the environment variable first
pub fn locate() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let mut candidates = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/nexus-search/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("nexus-search/settings.yml"));
    }

    candidates.into_iter().find(|p| p.exists())
}
