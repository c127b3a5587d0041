//! Configuration management for the CLI
//!
//! Settings are layered: built-in defaults, then
//! `~/.config/bundle-triage/config.json`, then `BUNDLE_TRIAGE_*` environment
//! variables. Command-line flags override all of them in `main`.

use anyhow::{Context, Result};
use bundle_lib::DEFAULT_DISPLAY_CAP;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "BUNDLE_TRIAGE";

/// CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Attention items shown before `--expanded` is needed
    #[serde(default = "default_display_cap")]
    pub display_cap: usize,

    /// Largest bundle accepted, in MiB of uncompressed files
    #[serde(default = "default_max_uncompressed_mib")]
    pub max_uncompressed_mib: u64,

    /// Default output format (`table` or `json`)
    #[serde(default)]
    pub format: Option<String>,
}

fn default_display_cap() -> usize {
    DEFAULT_DISPLAY_CAP
}

fn default_max_uncompressed_mib() -> u64 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_cap: default_display_cap(),
            max_uncompressed_mib: default_max_uncompressed_mib(),
            format: None,
        }
    }
}

impl Settings {
    /// Load settings from the user config file (if any) and the environment
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::load_layers(None),
        }
    }

    /// Load with an explicit config file path; a missing file is not an error
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_layers(Some(path))
    }

    fn load_layers(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Json)
                    .required(false),
            );
        }
        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn max_uncompressed_bytes(&self) -> u64 {
        self.max_uncompressed_mib.saturating_mul(1024 * 1024)
    }

    /// Location of the user config file
    pub fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| {
            home.join(".config")
                .join("bundle-triage")
                .join("config.json")
        })
    }
}
