use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::json_backend::{CARRYOVERS_FILE, CATALOG_FILE, TRANSACTIONS_FILE};

/// User preferences for report generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    pub locale: String,
    pub currency: String,
    /// Compute the current month's carryover the first time its report is requested.
    #[serde(default = "default_true")]
    pub auto_carryover: bool,
    /// Presentation toggle: whether renderers show the carryover line.
    #[serde(default = "default_true")]
    pub show_carryover: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_transactions_file")]
    pub transactions_file: String,
    #[serde(default = "default_carryovers_file")]
    pub carryovers_file: String,
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            auto_carryover: true,
            show_carryover: true,
            data_dir: None,
            transactions_file: default_transactions_file(),
            carryovers_file: default_carryovers_file(),
            catalog_file: default_catalog_file(),
        }
    }
}

impl ReportConfig {
    /// Resolves the data directory, falling back to `fallback` when unset.
    pub fn resolve_data_dir(&self, fallback: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

fn default_true() -> bool {
    true
}

fn default_transactions_file() -> String {
    TRANSACTIONS_FILE.into()
}

fn default_carryovers_file() -> String {
    CARRYOVERS_FILE.into()
}

fn default_catalog_file() -> String {
    CATALOG_FILE.into()
}
