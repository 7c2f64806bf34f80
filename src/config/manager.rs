use std::{
    fs,
    path::{Path, PathBuf},
};

use super::{app_data_dir, config_file_in, ConfigError, ReportConfig};
use crate::utils::persistence::write_atomic;

/// Handles persistence of [`ReportConfig`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        let config_path = config_file_in(&base);
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            base_dir: base,
            config_path,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<ReportConfig, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            Ok(ReportConfig::default())
        }
    }

    pub fn save(&self, config: &ReportConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        write_atomic(&self.config_path, &json).map_err(|err| ConfigError::Serde(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, ReportConfig::default());
        assert!(config.auto_carryover);
    }

    #[test]
    fn saved_config_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = ReportConfig {
            currency: "MXN".into(),
            auto_carryover: false,
            ..ReportConfig::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn older_files_pick_up_new_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), r#"{"locale":"es-MX","currency":"MXN"}"#).unwrap();
        let config = manager.load().unwrap();
        assert!(config.show_carryover);
        assert_eq!(config.transactions_file, "transactions.json");
    }
}
