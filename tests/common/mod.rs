#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use report_core::{
    config::{data_dir_in, ConfigManager, ReportConfig},
    storage::{JsonCarryoverStore, JsonCatalog, JsonTransactionSource},
    Catalog, FixedClock, ReportEngine, Transaction,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Files backing one isolated test environment.
pub struct TestEnv {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub config: ConfigManager,
}

impl TestEnv {
    pub fn transactions(&self) -> JsonTransactionSource {
        JsonTransactionSource::in_dir(&self.data_dir)
    }

    pub fn carryovers(&self) -> JsonCarryoverStore {
        JsonCarryoverStore::in_dir(&self.data_dir)
    }

    pub fn catalog(&self) -> JsonCatalog {
        JsonCatalog::in_dir(&self.data_dir)
    }

    pub fn seed(&self, transactions: &[Transaction], catalog: &Catalog) {
        self.transactions()
            .save(transactions)
            .expect("write transactions fixture");
        self.catalog().save(catalog).expect("write catalog fixture");
    }

    /// Engine over the JSON files with "today" pinned to `today`.
    pub fn engine(&self, today: NaiveDate) -> ReportEngine {
        self.engine_with(ReportConfig::default(), today)
    }

    pub fn engine_with(&self, config: ReportConfig, today: NaiveDate) -> ReportEngine {
        ReportEngine::open(config, &self.data_dir).with_clock(Box::new(FixedClock::on(today)))
    }
}

/// Creates an isolated data directory and config manager for each test.
pub fn setup_test_env() -> TestEnv {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let config =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    TestEnv {
        data_dir: data_dir_in(&base),
        base,
        config,
    }
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}
