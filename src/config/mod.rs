//! Persistent report preferences and the data directory layout.

pub mod manager;
pub mod model;

use std::{env, path::PathBuf};

use dirs::home_dir;
use thiserror::Error;

pub use manager::ConfigManager;
pub use model::ReportConfig;

const DEFAULT_DIR_NAME: &str = ".report_core";
const DATA_DIR: &str = "data";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Returns the application-specific directory, defaulting to `~/.report_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("REPORT_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding the transaction, carryover and catalog files under `base`.
pub fn data_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(DATA_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_DIR).join(CONFIG_FILE)
}
