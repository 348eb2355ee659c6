use std::path::PathBuf;

use thiserror::Error;

pub const DATA_DIR_ENV: &str = "HOTSEARCH_DATA_DIR";
const APP_DIR_NAME: &str = "hotsearch";
const SETTINGS_FILE_NAME: &str = "settings.json";
const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingPath(&'static str),
}

/// Filesystem locations used by the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub history_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(stable_app_data_dir())
    }
}

impl Config {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join(SETTINGS_FILE_NAME),
            history_path: data_dir.join(HISTORY_FILE_NAME),
            logs_dir: data_dir.join("logs"),
            data_dir,
        }
    }

    /// Honors `HOTSEARCH_DATA_DIR` when it is set to a non-empty value.
    pub fn from_env() -> Self {
        match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::with_data_dir(PathBuf::from(dir)),
            _ => Self::default(),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath("data_dir"));
    }

    if cfg.settings_path.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath("settings_path"));
    }

    if cfg.history_path.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath("history_path"));
    }

    if cfg.logs_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingPath("logs_dir"));
    }

    Ok(())
}
