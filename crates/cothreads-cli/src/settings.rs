//! Configuration file loading.
//!
//! Reads the `[kernel]` and `[log]` sections of a TOML file.  An explicitly
//! requested file must exist; the default `config/default.toml` is optional
//! and falls back to built-in defaults when missing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cothreads_kernel::KernelConfig;
use serde::Deserialize;

/// Location read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Everything the CLI reads from its configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub kernel: KernelConfig,
    pub log: LogSettings,
}

/// Settings loaded from the `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load settings from `explicit`, or from [`DEFAULT_CONFIG_PATH`] if it
/// exists, or fall back to defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok(Settings::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_settings(&content).with_context(|| format!("invalid config file {}", path.display()))
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(content).context("failed to parse TOML")?;
    settings.kernel.validate()?;
    Ok(settings)
}
