use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use unity_docs_index_core::synchronise::{DEFAULT_DOCS_DIR, DEFAULT_OUTPUT_FILE};

pub const VERSION_ENV: &str = "UNITY_DOCS_VERSION";
pub const CDN_URL_ENV: &str = "UNITY_DOCS_CDN_URL";

/// Settings as they may appear in a YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    project_root: Option<PathBuf>,
    docs_dir: Option<String>,
    output_file: Option<PathBuf>,
    cdn_url: Option<String>,
    descriptor: Option<PathBuf>,
    version: Option<String>,
}

/// Settings after merging the YAML file with the environment.
/// Command-line flags are applied on top by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub project_root: PathBuf,
    pub docs_dir: String,
    pub output_file: PathBuf,
    pub cdn_url: Option<String>,
    pub descriptor: Option<PathBuf>,
    pub version: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            docs_dir: DEFAULT_DOCS_DIR.to_string(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            cdn_url: None,
            descriptor: None,
            version: None,
        }
    }
}

/// Loads settings from an optional YAML file, then lets `UNITY_DOCS_VERSION`
/// and `UNITY_DOCS_CDN_URL` override what the file says.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let static_conf = match path {
        Some(path) => read_static_config(path)?,
        None => StaticConfig::default(),
    };

    let defaults = Settings::default();
    let mut settings = Settings {
        project_root: static_conf.project_root.unwrap_or(defaults.project_root),
        docs_dir: static_conf.docs_dir.unwrap_or(defaults.docs_dir),
        output_file: static_conf.output_file.unwrap_or(defaults.output_file),
        cdn_url: static_conf.cdn_url,
        descriptor: static_conf.descriptor,
        version: static_conf.version,
    };

    if let Some(version) = env_non_empty(VERSION_ENV) {
        info!(version = %version, "{VERSION_ENV} found in env");
        settings.version = Some(version);
    }
    if let Some(cdn_url) = env_non_empty(CDN_URL_ENV) {
        info!(cdn_url = %cdn_url, "{CDN_URL_ENV} found in env");
        settings.cdn_url = Some(cdn_url);
    }

    if settings.docs_dir.trim().is_empty() {
        error!("docs_dir must not be empty");
        anyhow::bail!("docs_dir must not be empty");
    }

    info!(
        project_root = %settings.project_root.display(),
        docs_dir = %settings.docs_dir,
        output_file = %settings.output_file.display(),
        "Settings loaded"
    );
    Ok(settings)
}

fn read_static_config(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        e
    })
    .with_context(|| format!("Failed to read config file {}", path.display()))?;

    // An empty file is a valid, empty configuration.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML {}: {e}", path.display())
    })
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
