pub mod json_backend;
pub mod memory;
pub mod records;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    domain::{Catalog, CarryoverRecord, ReferenceEntry, Transaction, TransactionFilter},
    errors::StorageError,
};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Read-only supplier of transactions, already normalized to canonical dates.
pub trait TransactionSource: Send + Sync {
    /// Transactions dated within `[start, end]`, both inclusive.
    fn fetch_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: Option<&TransactionFilter>,
    ) -> Result<Vec<Transaction>>;

    fn fetch_all(&self, filter: Option<&TransactionFilter>) -> Result<Vec<Transaction>>;

    /// Records the source could not normalize and left out of every fetch.
    fn load_warnings(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Keyed persistence for carryover records, one per `"{year}-{month:02}"` key.
pub trait CarryoverStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CarryoverRecord>>;

    /// Upsert by the record's key.
    fn put(&self, record: &CarryoverRecord) -> Result<()>;

    /// Atomically stores `record` unless its key is taken; returns whichever record
    /// ends up persisted.
    fn put_if_absent(&self, record: CarryoverRecord) -> Result<CarryoverRecord>;
}

/// Lookup tables used to label aggregation buckets.
pub trait ReferenceCatalog: Send + Sync {
    fn categories(&self) -> Result<Vec<ReferenceEntry>>;
    fn concepts(&self) -> Result<Vec<ReferenceEntry>>;
    fn subconcepts(&self) -> Result<Vec<ReferenceEntry>>;
    fn providers(&self) -> Result<Vec<ReferenceEntry>>;

    fn load_catalog(&self) -> Result<Catalog> {
        Ok(Catalog {
            categories: self.categories()?,
            concepts: self.concepts()?,
            subconcepts: self.subconcepts()?,
            providers: self.providers()?,
        })
    }
}

impl ReferenceCatalog for Catalog {
    fn categories(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.categories.clone())
    }

    fn concepts(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.concepts.clone())
    }

    fn subconcepts(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.subconcepts.clone())
    }

    fn providers(&self) -> Result<Vec<ReferenceEntry>> {
        Ok(self.providers.clone())
    }

    fn load_catalog(&self) -> Result<Catalog> {
        Ok(self.clone())
    }
}

impl<T: TransactionSource + ?Sized> TransactionSource for Arc<T> {
    fn fetch_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filter: Option<&TransactionFilter>,
    ) -> Result<Vec<Transaction>> {
        (**self).fetch_by_date_range(start, end, filter)
    }

    fn fetch_all(&self, filter: Option<&TransactionFilter>) -> Result<Vec<Transaction>> {
        (**self).fetch_all(filter)
    }

    fn load_warnings(&self) -> Result<Vec<String>> {
        (**self).load_warnings()
    }
}

impl<T: CarryoverStore + ?Sized> CarryoverStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<CarryoverRecord>> {
        (**self).get(key)
    }

    fn put(&self, record: &CarryoverRecord) -> Result<()> {
        (**self).put(record)
    }

    fn put_if_absent(&self, record: CarryoverRecord) -> Result<CarryoverRecord> {
        (**self).put_if_absent(record)
    }
}

impl<T: ReferenceCatalog + ?Sized> ReferenceCatalog for Arc<T> {
    fn categories(&self) -> Result<Vec<ReferenceEntry>> {
        (**self).categories()
    }

    fn concepts(&self) -> Result<Vec<ReferenceEntry>> {
        (**self).concepts()
    }

    fn subconcepts(&self) -> Result<Vec<ReferenceEntry>> {
        (**self).subconcepts()
    }

    fn providers(&self) -> Result<Vec<ReferenceEntry>> {
        (**self).providers()
    }

    fn load_catalog(&self) -> Result<Catalog> {
        (**self).load_catalog()
    }
}

/// Applies the date range and filter, ordering chronologically with insertion time as
/// the tie-breaker.
pub(crate) fn select_transactions<'a, I>(
    transactions: I,
    range: Option<(NaiveDate, NaiveDate)>,
    filter: Option<&TransactionFilter>,
) -> Vec<Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut selected: Vec<Transaction> = transactions
        .into_iter()
        .filter(|txn| range.map_or(true, |(start, end)| txn.date >= start && txn.date <= end))
        .filter(|txn| filter.map_or(true, |f| f.matches(txn)))
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
    selected
}

pub use json_backend::{JsonCarryoverStore, JsonCatalog, JsonTransactionSource};
pub use memory::{InMemoryCarryoverStore, InMemoryTransactionSource};
pub use records::{LoadReport, RawDate, RawTransaction};
