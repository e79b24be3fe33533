//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use papertext_fulltext::config::{DEFAULT_CADENCE, DEFAULT_SAMPLE_LIMIT, DEFAULT_ZSTD_LEVEL};
use serde::{Deserialize, Deserializer};

/// Global settings for papertext
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub checkpoint: CheckpointConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the `.json.xz` archives
    #[serde(deserialize_with = "deserialize_env_path")]
    pub source_dir: PathBuf,
    /// Checkpoint folders and output files are created here
    #[serde(deserialize_with = "deserialize_env_path")]
    pub storage_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./core_fulltext"),
            storage_root: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub cadence: usize,
    pub sample_limit: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            cadence: DEFAULT_CADENCE,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub compression_level: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

/// Deserialize a path that may be an environment variable reference like ${VAR}
fn deserialize_env_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    expand_env_var(&raw)
        .map(PathBuf::from)
        .ok_or_else(|| serde::de::Error::custom(format!("environment variable in '{raw}' is not set")))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Settings {
    /// Load settings from default locations
    ///
    /// Search order:
    /// 1. ./papertext.toml (current directory)
    /// 2. ~/.config/papertext/config.toml
    ///
    /// If no settings file is found, returns defaults.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("papertext.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "papertext") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load settings from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(settings)
    }
}
