use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::model::ReportConfig,
    core::{
        services::{
            CarryoverCheck, CarryoverService, MixedTreeComparator, ReportStatsAggregator,
        },
        time::{Clock, SystemClock},
    },
    domain::{
        Catalog, CarryoverRecord, MixedTreeRow, MonthKey, PaymentStatus, ReportFilters,
        ReportStats, Transaction,
    },
    errors::{ReportError, Result},
    storage::{
        CarryoverStore, JsonCarryoverStore, JsonCatalog, JsonTransactionSource,
        ReferenceCatalog, TransactionSource,
    },
};

/// Everything a renderer needs for one reporting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub filters: ReportFilters,
    pub stats: ReportStats,
    pub transactions: Vec<Transaction>,
    pub mixed_trees: Vec<MixedTreeRow>,
    pub carryover: Option<CarryoverRecord>,
    /// Degraded reads and skipped records that did not stop the report.
    pub warnings: Vec<String>,
}

/// Entry point for report generation and carryover bookkeeping.
///
/// Collaborators are read sequentially; the only write is the carryover record
/// for a month that has none yet.
pub struct ReportEngine {
    source: Box<dyn TransactionSource>,
    carryovers: Box<dyn CarryoverStore>,
    catalog: Box<dyn ReferenceCatalog>,
    clock: Box<dyn Clock>,
    config: ReportConfig,
}

impl ReportEngine {
    pub fn new(
        source: Box<dyn TransactionSource>,
        carryovers: Box<dyn CarryoverStore>,
        catalog: Box<dyn ReferenceCatalog>,
    ) -> Self {
        Self {
            source,
            carryovers,
            catalog,
            clock: Box::new(SystemClock),
            config: ReportConfig::default(),
        }
    }

    /// Engine over the JSON files named by `config`, resolved against `data_dir`
    /// unless the config pins its own directory.
    pub fn open(config: ReportConfig, data_dir: &Path) -> Self {
        let dir = config.resolve_data_dir(data_dir);
        info!(data_dir = %dir.display(), "opening report data");
        let source = JsonTransactionSource::new(dir.join(&config.transactions_file));
        let carryovers = JsonCarryoverStore::new(dir.join(&config.carryovers_file));
        let catalog = JsonCatalog::new(dir.join(&config.catalog_file));
        Self::new(Box::new(source), Box::new(carryovers), Box::new(catalog)).with_config(config)
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn carryover_service(&self) -> CarryoverService<'_> {
        CarryoverService::new(
            self.source.as_ref(),
            self.carryovers.as_ref(),
            self.clock.as_ref(),
        )
    }

    fn load_catalog(&self) -> Result<Catalog> {
        self.catalog.load_catalog().map_err(ReportError::generation)
    }

    /// Aggregates `transactions` for the period in `filters`, crediting the stored
    /// carryover of the period's first month when one can be read.
    pub fn generate_report_stats(
        &self,
        transactions: &[Transaction],
        filters: &ReportFilters,
    ) -> Result<ReportStats> {
        let catalog = self.load_catalog()?;
        let carryover = self.carryover_for_period(filters, &mut Vec::new());
        Ok(ReportStatsAggregator::new(&catalog)
            .with_carryover(carryover.as_ref())
            .generate_stats(transactions, filters))
    }

    /// In-period transactions plus the unpaid expenses dated before the period start.
    pub fn get_filtered_transactions(&self, filters: &ReportFilters) -> Result<Vec<Transaction>> {
        let criteria = (!filters.criteria.is_empty()).then_some(&filters.criteria);
        let mut transactions = match filters.range() {
            Some((start, end)) => self
                .source
                .fetch_by_date_range(start, end, criteria)
                .map_err(ReportError::generation)?,
            None => self
                .source
                .fetch_all(criteria)
                .map_err(ReportError::generation)?
                .into_iter()
                .filter(|txn| filters.in_period(txn.date))
                .collect(),
        };

        if filters.start_date.is_some() {
            let candidates = self
                .source
                .fetch_all(criteria)
                .map_err(ReportError::generation)?
                .into_iter()
                .filter(|txn| {
                    txn.is_expense()
                        && filters.precedes_start(txn.date)
                        && txn.effective_status() == PaymentStatus::Unpaid
                });
            transactions.extend(candidates);
        }

        transactions.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        debug!(count = transactions.len(), "filtered transactions");
        Ok(transactions)
    }

    pub fn calculate_and_save_carryover(&self, year: i32, month: u32) -> Result<CarryoverRecord> {
        let month = MonthKey::new(year, month)?;
        self.carryover_service()
            .calculate_and_save(month)
            .map_err(ReportError::carryover)
    }

    pub fn get_carryover_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Option<CarryoverRecord>> {
        let month = MonthKey::new(year, month)?;
        self.carryover_service()
            .get_for_month(month)
            .map_err(ReportError::carryover)
    }

    /// Makes sure the current month has a carryover record. Failures come back in
    /// the message, never as an error.
    pub fn check_and_calculate_carryover_if_needed(&self) -> CarryoverCheck {
        self.carryover_service().check_and_calculate_if_needed()
    }

    pub fn calculate_tree_comparison(
        &self,
        all_transactions: &[Transaction],
        stats: &ReportStats,
        filters: &ReportFilters,
        catalog: &Catalog,
    ) -> Vec<MixedTreeRow> {
        MixedTreeComparator::new(catalog, self.clock.today()).compare_trees(
            all_transactions,
            stats,
            filters,
        )
    }

    /// Runs the full pipeline for one period.
    pub fn build_report(&self, filters: &ReportFilters) -> Result<Report> {
        let mut warnings = Vec::new();

        if self.config.auto_carryover && self.covers_current_month(filters) {
            let check = self.check_and_calculate_carryover_if_needed();
            if check.data.is_none() {
                warnings.push(check.message);
            }
        }

        let mut transactions = self.get_filtered_transactions(filters)?;
        match self.source.load_warnings() {
            Ok(skipped) => warnings.extend(skipped),
            Err(err) => warn!(error = %err, "could not collect source warnings"),
        }
        let catalog = self.load_catalog()?;
        let carryover = self.carryover_for_period(filters, &mut warnings);

        if self.config.show_carryover && !transactions.iter().any(|txn| txn.is_carryover) {
            let synthetic = carryover
                .as_ref()
                .and_then(CarryoverService::materialize)
                .filter(|txn| filters.in_period(txn.date));
            if let Some(txn) = synthetic {
                transactions.insert(0, txn);
            }
        }

        let stats = ReportStatsAggregator::new(&catalog)
            .with_carryover(carryover.as_ref())
            .generate_stats(&transactions, filters);
        if stats.skipped_records > 0 {
            warnings.push(format!(
                "{} malformed transaction(s) were skipped",
                stats.skipped_records
            ));
        }

        let all_transactions = self
            .source
            .fetch_all(None)
            .map_err(ReportError::generation)?;
        let mixed_trees =
            self.calculate_tree_comparison(&all_transactions, &stats, filters, &catalog);

        info!(
            transactions = transactions.len(),
            mixed_rows = mixed_trees.len(),
            warnings = warnings.len(),
            "report built"
        );
        Ok(Report {
            filters: filters.clone(),
            stats,
            transactions,
            mixed_trees,
            carryover,
            warnings,
        })
    }

    fn covers_current_month(&self, filters: &ReportFilters) -> bool {
        let current = MonthKey::containing(self.clock.today());
        filters.start_date.map_or(true, |start| start <= current.last_day())
            && filters.end_date.map_or(true, |end| end >= current.first_day())
    }

    /// Stored carryover for the month the period starts in. A failed read is
    /// reported and treated as no carryover.
    fn carryover_for_period(
        &self,
        filters: &ReportFilters,
        warnings: &mut Vec<String>,
    ) -> Option<CarryoverRecord> {
        let month = filters.start_date.map(MonthKey::containing)?;
        match self.carryover_service().get_for_month(month) {
            Ok(record) => record,
            Err(err) => {
                warn!(month = %month, error = %err, "carryover unavailable for report");
                warnings.push(format!("Carryover for {month} unavailable: {err}"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        core::time::FixedClock,
        storage::{InMemoryCarryoverStore, InMemoryTransactionSource},
    };

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn engine(transactions: Vec<Transaction>, today: NaiveDate) -> ReportEngine {
        ReportEngine::new(
            Box::new(InMemoryTransactionSource::new(transactions)),
            Box::new(InMemoryCarryoverStore::new()),
            Box::new(Catalog::default()),
        )
        .with_clock(Box::new(FixedClock::on(today)))
    }

    #[test]
    fn filtered_transactions_pull_in_unpaid_expenses_before_the_start() {
        let engine = engine(
            vec![
                Transaction::expense(Decimal::from(70), ymd(2024, 2, 20)),
                Transaction::expense(Decimal::from(30), ymd(2024, 2, 21)).paid_in_full(),
                Transaction::income(Decimal::from(900), ymd(2024, 3, 4)),
                Transaction::income(Decimal::from(5), ymd(2024, 4, 1)),
            ],
            ymd(2024, 3, 10),
        );
        let filters = ReportFilters::for_month(MonthKey::new(2024, 3).unwrap());
        let txns = engine.get_filtered_transactions(&filters).unwrap();
        let amounts: Vec<_> = txns.iter().map(|txn| txn.amount).collect();
        assert_eq!(amounts, vec![Decimal::from(70), Decimal::from(900)]);
    }

    #[test]
    fn invalid_month_is_rejected() {
        let engine = engine(Vec::new(), ymd(2024, 3, 10));
        assert!(matches!(
            engine.calculate_and_save_carryover(2024, 13),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[test]
    fn report_for_the_current_month_stores_its_carryover_once() {
        let engine = engine(
            vec![
                Transaction::income(Decimal::from(1_000), ymd(2024, 2, 3)),
                Transaction::expense(Decimal::from(400), ymd(2024, 2, 9)).paid_in_full(),
                Transaction::income(Decimal::from(250), ymd(2024, 3, 2)),
            ],
            ymd(2024, 3, 10),
        );
        let filters = ReportFilters::for_month(MonthKey::new(2024, 3).unwrap());
        let report = engine.build_report(&filters).unwrap();

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        let carryover = report.carryover.expect("carryover computed");
        assert_eq!(carryover.carryover_balance, Decimal::from(600));
        // Shown as a synthetic income line, not double counted as carryover income.
        assert!(report.transactions[0].is_carryover);
        assert_eq!(report.stats.total_income, Decimal::from(250));
        assert_eq!(report.stats.carryover_income, Decimal::ZERO);
        assert_eq!(report.stats.total_balance, Decimal::from(850));

        let again = engine.check_and_calculate_carryover_if_needed();
        assert!(!again.calculated);
    }

    #[test]
    fn a_range_inside_the_current_month_triggers_the_carryover_check() {
        let engine = engine(
            vec![
                Transaction::income(Decimal::from(1_000), ymd(2024, 2, 12)),
                Transaction::income(Decimal::from(80), ymd(2024, 3, 6)),
            ],
            ymd(2024, 3, 10),
        );
        let earlier = ReportFilters::between(ymd(2024, 1, 1), ymd(2024, 2, 29)).unwrap();
        engine.build_report(&earlier).unwrap();
        assert_eq!(engine.get_carryover_for_month(2024, 3).unwrap(), None);

        let filters = ReportFilters::between(ymd(2024, 3, 4), ymd(2024, 3, 17)).unwrap();
        let report = engine.build_report(&filters).unwrap();
        let carryover = report.carryover.expect("carryover computed");
        assert_eq!(carryover.carryover_balance, Decimal::from(1_000));
        assert_eq!(
            engine.get_carryover_for_month(2024, 3).unwrap(),
            Some(carryover)
        );
    }

    #[test]
    fn hidden_carryover_is_credited_as_carryover_income() {
        let config = ReportConfig {
            show_carryover: false,
            ..ReportConfig::default()
        };
        let engine = engine(
            vec![
                Transaction::income(Decimal::from(1_000), ymd(2024, 2, 3)),
                Transaction::income(Decimal::from(250), ymd(2024, 3, 2)),
            ],
            ymd(2024, 3, 10),
        )
        .with_config(config);
        let filters = ReportFilters::for_month(MonthKey::new(2024, 3).unwrap());
        let report = engine.build_report(&filters).unwrap();
        assert!(report.transactions.iter().all(|txn| !txn.is_carryover));
        assert_eq!(report.stats.carryover_income, Decimal::from(1_000));
        assert_eq!(report.stats.total_balance, Decimal::from(1_250));
    }
}
