use std::{
    collections::BTreeMap,
    sync::{Mutex, RwLock},
};

use chrono::NaiveDate;

use crate::{
    domain::{CarryoverRecord, Transaction, TransactionFilter},
    errors::StorageError,
};

use super::{select_transactions, CarryoverStore, Result, TransactionSource};

/// Transaction source over an owned vector; handy for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryTransactionSource {
    transactions: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionSource {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: RwLock::new(transactions),
        }
    }

    pub fn push(&self, transaction: Transaction) -> Result<()> {
        self.transactions
            .write()
            .map_err(|_| poisoned("transaction source"))?
            .push(transaction);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.transactions.read().map(|txns| txns.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionSource for InMemoryTransactionSource {
    fn fetch_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: Option<&TransactionFilter>,
    ) -> Result<Vec<Transaction>> {
        let guard = self
            .transactions
            .read()
            .map_err(|_| poisoned("transaction source"))?;
        Ok(select_transactions(guard.iter(), Some((start, end)), filter))
    }

    fn fetch_all(&self, filter: Option<&TransactionFilter>) -> Result<Vec<Transaction>> {
        let guard = self
            .transactions
            .read()
            .map_err(|_| poisoned("transaction source"))?;
        Ok(select_transactions(guard.iter(), None, filter))
    }
}

/// Carryover records held behind a mutex so create-if-absent is atomic in-process.
#[derive(Debug, Default)]
pub struct InMemoryCarryoverStore {
    records: Mutex<BTreeMap<String, CarryoverRecord>>,
}

impl InMemoryCarryoverStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl CarryoverStore for InMemoryCarryoverStore {
    fn get(&self, key: &str) -> Result<Option<CarryoverRecord>> {
        let records = self.records.lock().map_err(|_| poisoned("carryover store"))?;
        Ok(records.get(key).cloned())
    }

    fn put(&self, record: &CarryoverRecord) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| poisoned("carryover store"))?;
        records.insert(record.storage_key(), record.clone());
        Ok(())
    }

    fn put_if_absent(&self, record: CarryoverRecord) -> Result<CarryoverRecord> {
        let mut records = self.records.lock().map_err(|_| poisoned("carryover store"))?;
        Ok(records
            .entry(record.storage_key())
            .or_insert(record)
            .clone())
    }
}

fn poisoned(what: &str) -> StorageError {
    StorageError::Unavailable(format!("{what} lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MonthKey;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn record(balance: i64) -> CarryoverRecord {
        CarryoverRecord::compute(
            MonthKey::new(2024, 4).unwrap(),
            Decimal::from(balance),
            Decimal::ZERO,
            Decimal::ZERO,
            Utc::now(),
        )
    }

    #[test]
    fn put_if_absent_keeps_first_record() {
        let store = InMemoryCarryoverStore::new();
        let first = store.put_if_absent(record(100)).unwrap();
        let second = store.put_if_absent(record(900)).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.carryover_balance, Decimal::from(100));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_overwrites_same_key() {
        let store = InMemoryCarryoverStore::new();
        store.put(&record(100)).unwrap();
        store.put(&record(250)).unwrap();
        let stored = store.get("2024-04").unwrap().expect("record stored");
        assert_eq!(stored.carryover_balance, Decimal::from(250));
        assert_eq!(store.keys(), vec!["2024-04".to_string()]);
    }

    #[test]
    fn range_fetch_is_inclusive_and_chronological() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        let source = InMemoryTransactionSource::new(vec![
            Transaction::income(Decimal::from(3), day(30)),
            Transaction::income(Decimal::from(1), day(1)),
            Transaction::income(Decimal::from(2), day(15)),
        ]);
        let fetched = source.fetch_by_date_range(day(1), day(30), None).unwrap();
        let dates: Vec<_> = fetched.iter().map(|txn| txn.date).collect();
        assert_eq!(dates, vec![day(1), day(15), day(30)]);
    }
}
