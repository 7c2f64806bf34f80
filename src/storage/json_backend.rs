use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::NaiveDate;
use serde_json::Value;

use crate::{
    domain::{Catalog, CarryoverRecord, ReferenceEntry, Transaction, TransactionFilter},
    errors::StorageError,
    utils::persistence::{load_json, save_json},
};

use super::{
    records::LoadReport, select_transactions, CarryoverStore, ReferenceCatalog, Result,
    TransactionSource,
};

pub const TRANSACTIONS_FILE: &str = "transactions.json";
pub const CARRYOVERS_FILE: &str = "carryovers.json";
pub const CATALOG_FILE: &str = "catalog.json";

/// Reads a JSON array of raw transaction records from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonTransactionSource {
    path: PathBuf,
}

impl JsonTransactionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TRANSACTIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and normalizes every record, collecting warnings for skipped ones.
    pub fn load(&self) -> Result<LoadReport> {
        let values: Vec<Value> = match load_json::<Value>(&self.path)? {
            None => Vec::new(),
            Some(Value::Array(values)) => values,
            Some(_) => {
                return Err(StorageError::Corrupt(format!(
                    "`{}` must contain a JSON array",
                    self.path.display()
                )))
            }
        };
        Ok(LoadReport::from_values(values))
    }

    /// Replaces the file contents with canonical records.
    pub fn save(&self, transactions: &[Transaction]) -> Result<()> {
        save_json(&transactions, &self.path)
    }
}

impl TransactionSource for JsonTransactionSource {
    fn fetch_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: Option<&TransactionFilter>,
    ) -> Result<Vec<Transaction>> {
        let report = self.load()?;
        Ok(select_transactions(
            report.transactions.iter(),
            Some((start, end)),
            filter,
        ))
    }

    fn fetch_all(&self, filter: Option<&TransactionFilter>) -> Result<Vec<Transaction>> {
        let report = self.load()?;
        Ok(select_transactions(report.transactions.iter(), None, filter))
    }

    fn load_warnings(&self) -> Result<Vec<String>> {
        Ok(self.load()?.warnings)
    }
}

/// One JSON object mapping `"{year}-{month:02}"` keys to carryover records.
#[derive(Debug)]
pub struct JsonCarryoverStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCarryoverStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CARRYOVERS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> Result<BTreeMap<String, CarryoverRecord>> {
        Ok(load_json(&self.path)?.unwrap_or_default())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("carryover file lock poisoned".into()))
    }
}

impl CarryoverStore for JsonCarryoverStore {
    fn get(&self, key: &str) -> Result<Option<CarryoverRecord>> {
        Ok(self.all()?.remove(key))
    }

    fn put(&self, record: &CarryoverRecord) -> Result<()> {
        let _guard = self.lock()?;
        let mut records = self.all()?;
        records.insert(record.storage_key(), record.clone());
        save_json(&records, &self.path)
    }

    fn put_if_absent(&self, record: CarryoverRecord) -> Result<CarryoverRecord> {
        let _guard = self.lock()?;
        let mut records = self.all()?;
        if let Some(existing) = records.get(&record.storage_key()) {
            return Ok(existing.clone());
        }
        records.insert(record.storage_key(), record.clone());
        save_json(&records, &self.path)?;
        Ok(record)
    }
}

/// Catalog tables stored together in a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CATALOG_FILE))
    }

    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        save_json(catalog, &self.path)
    }
}

impl ReferenceCatalog for JsonCatalog {
    fn categories(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.load_catalog()?.categories)
    }

    fn concepts(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.load_catalog()?.concepts)
    }

    fn subconcepts(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.load_catalog()?.subconcepts)
    }

    fn providers(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.load_catalog()?.providers)
    }

    fn load_catalog(&self) -> Result<Catalog> {
        Ok(load_json(&self.path)?.unwrap_or_default())
    }
}
