use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub launch_config_path: PathBuf,
    pub directory_db_path: PathBuf,
    pub lists_dir: PathBuf,
    pub log_filter: String,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            launch_config_path: base.join("launch.json"),
            directory_db_path: base.join("directory.sqlite3"),
            lists_dir: base.join("lists"),
            log_filter: "info".to_string(),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    std::env::temp_dir().join("launchbar")
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.launch_config_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("launch_config_path is required".into()));
    }

    if cfg.directory_db_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("directory_db_path is required".into()));
    }

    if cfg.lists_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("lists_dir is required".into()));
    }

    if cfg.log_filter.trim().is_empty() {
        return Err(ConfigError::Invalid("log_filter is required".into()));
    }

    Ok(())
}

/// Loads the runtime config, falling back to defaults when the file is absent.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    let mut cfg = match std::fs::read_to_string(&config_path) {
        Ok(raw) => toml::from_str::<Config>(&raw)?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Config::default(),
        Err(error) => return Err(error.into()),
    };
    cfg.config_path = config_path;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg)?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let encoded = toml::to_string_pretty(cfg)?;
    std::fs::write(&cfg.config_path, encoded)?;
    Ok(())
}
