//! Configuration for dropspot paths and tunables.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (DROPSPOT_HOME, DROPSPOT_DATA)
//! 2. Config file (.dropspot/config.yaml)
//! 3. Defaults (~/.dropspot)
//!
//! Config file discovery:
//! - Searches current directory and parents for .dropspot/config.yaml
//! - Paths in config file are relative to the config file's parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::expiry::DEFAULT_PRESETS;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default sweep interval in seconds
const DEFAULT_SWEEP_SECS: u64 = 300;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub expiry: Option<ExpiryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
    /// Content data directory (relative to config file)
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpiryConfig {
    /// Seconds between background sweeps
    pub sweep_interval_secs: Option<u64>,
    /// Preset option list shown to clients, replacing the default order.
    /// The option grammar itself is fixed.
    pub presets: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to dropspot home (state: expiry file)
    pub home: PathBuf,
    /// Absolute path to the content data root (category directories)
    pub data: PathBuf,
    /// Seconds between background sweeps
    pub sweep_interval_secs: u64,
    /// Expiry preset list offered to clients
    pub expiry_presets: Vec<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// The sweep interval as a duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Path of the persisted expiry document
    pub fn expiry_path(&self) -> PathBuf {
        self.home.join("expirations.json")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".dropspot").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".dropspot");

    let config_file = find_config_file();

    let (home, data, sweep_interval_secs, expiry_presets) =
        if let Some(ref config_path) = config_file {
            let config = load_config_file(config_path)?;

            // Base directory is the parent of .dropspot/
            let base_dir = config_path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."));

            let home = if let Ok(env_home) = std::env::var("DROPSPOT_HOME") {
                PathBuf::from(env_home)
            } else if let Some(ref home_path) = config.paths.home {
                // home is relative to the .dropspot/ directory
                let dropspot_dir = config_path.parent().unwrap_or(Path::new("."));
                resolve_path(dropspot_dir, home_path)
            } else {
                default_home.clone()
            };

            let data = if let Ok(env_data) = std::env::var("DROPSPOT_DATA") {
                PathBuf::from(env_data)
            } else if let Some(ref data_path) = config.paths.data {
                resolve_path(base_dir, data_path)
            } else {
                home.join("data")
            };

            let sweep_interval_secs = config
                .expiry
                .as_ref()
                .and_then(|e| e.sweep_interval_secs)
                .unwrap_or(DEFAULT_SWEEP_SECS);

            let expiry_presets = config
                .expiry
                .as_ref()
                .and_then(|e| e.presets.clone())
                .unwrap_or_else(default_presets);

            (home, data, sweep_interval_secs, expiry_presets)
        } else {
            let home = std::env::var("DROPSPOT_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_home.clone());

            let data = std::env::var("DROPSPOT_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join("data"));

            (home, data, DEFAULT_SWEEP_SECS, default_presets())
        };

    Ok(ResolvedConfig {
        home,
        data,
        sweep_interval_secs,
        expiry_presets,
        config_file,
    })
}

fn default_presets() -> Vec<String> {
    DEFAULT_PRESETS.iter().map(|s| s.to_string()).collect()
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the dropspot home directory (state).
pub fn dropspot_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the content data root.
pub fn data_dir() -> Result<PathBuf> {
    Ok(config()?.data.clone())
}

/// Get the path of the persisted expiry document.
pub fn expiry_path() -> Result<PathBuf> {
    Ok(config()?.expiry_path())
}
