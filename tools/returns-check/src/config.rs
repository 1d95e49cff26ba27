//! Configuration types and loading
//!
//! Path precedence: --config flag > RETURNS_CHECK_CONFIG env var > default
//! file name. The password is never part of the config; login reads it from
//! RETURNS_PASSWORD at the moment it is needed.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

fn default_timeout() -> u64 {
    30
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("returns-credentials.json")
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            bail!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            );
        }

        if config.api.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or RETURNS_CHECK_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("RETURNS_CHECK_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("returns-check.toml")
    }
}
