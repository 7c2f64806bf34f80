//! Period statistics: totals, breakdowns, payment-status tallies, weekly buckets.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    core::services::week_service::WeekBucketer,
    domain::{
        category::NO_DIVISION_LABEL,
        report::{Breakdown, PathWeeklyTotals},
        Catalog, CarryoverRecord, MonthKey, PaymentStatus, ReportFilters, ReportStats,
        Transaction, WeeklyBreakdown,
    },
};

/// Where a transaction lands relative to the reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionClass {
    /// Unpaid expense dated before the period start.
    CarryoverCandidate,
    InPeriod,
    OutOfPeriod,
}

pub struct ReportStatsAggregator<'a> {
    catalog: &'a Catalog,
    carryover: Option<&'a CarryoverRecord>,
}

impl<'a> ReportStatsAggregator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            carryover: None,
        }
    }

    /// Carryover record for the reported month, if one is available.
    pub fn with_carryover(mut self, carryover: Option<&'a CarryoverRecord>) -> Self {
        self.carryover = carryover;
        self
    }

    pub fn classify(txn: &Transaction, filters: &ReportFilters) -> TransactionClass {
        if txn.is_expense()
            && txn.effective_status() == PaymentStatus::Unpaid
            && filters.precedes_start(txn.date)
        {
            TransactionClass::CarryoverCandidate
        } else if filters.in_period(txn.date) {
            TransactionClass::InPeriod
        } else {
            TransactionClass::OutOfPeriod
        }
    }

    pub fn generate_stats(
        &self,
        transactions: &[Transaction],
        filters: &ReportFilters,
    ) -> ReportStats {
        let mut stats = ReportStats::default();
        let mut materialized_carryover = Decimal::ZERO;

        for txn in transactions {
            if !txn.is_well_formed() {
                warn!(id = %txn.id, "skipping transaction with negative amounts");
                stats.skipped_records += 1;
                continue;
            }
            if !filters.criteria.matches(txn) {
                continue;
            }
            match Self::classify(txn, filters) {
                TransactionClass::CarryoverCandidate => {
                    let outstanding = txn.outstanding();
                    stats
                        .payment_status_expense
                        .prior_pending
                        .record(PaymentStatus::Unpaid, txn);
                    stats.payment_status_expense.unpaid.carryover += outstanding;
                    stats.carryover_balance += outstanding;
                }
                TransactionClass::InPeriod if txn.is_income() && txn.is_carryover => {
                    stats.current_period_balance += txn.amount;
                    materialized_carryover += txn.amount;
                }
                TransactionClass::InPeriod => self.accumulate(&mut stats, txn),
                TransactionClass::OutOfPeriod => {}
            }
        }

        self.finalize(&mut stats, materialized_carryover);
        if let Some((start, end)) = filters.range() {
            stats.weekly_breakdown = self.weekly_breakdown(transactions, filters, start, end);
        }
        debug!(
            income = %stats.total_income,
            expenses = %stats.total_expenses,
            balance = %stats.total_balance,
            transactions = stats.total_transactions,
            "generated report stats"
        );
        stats
    }

    fn accumulate(&self, stats: &mut ReportStats, txn: &Transaction) {
        let status = txn.effective_status();
        if txn.is_income() {
            stats.total_income += txn.amount;
            stats.income_count += 1;
            stats.current_period_balance += txn.amount;
            stats.payment_status_income.bucket_mut(status).record(status, txn);
        } else {
            stats.total_expenses += txn.amount;
            stats.expense_count += 1;
            stats.current_period_balance -= txn.amount;
            stats.payment_status_expense.bucket_mut(status).record(status, txn);
            record(
                &mut stats.by_provider,
                self.catalog.provider_label(txn.provider_id),
                txn,
            );
        }

        record(
            &mut stats.by_category,
            self.catalog.category_label(txn.general_id),
            txn,
        );
        record(
            &mut stats.by_concept,
            self.catalog.concept_label(txn.concept_id),
            txn,
        );
        record(
            &mut stats.by_subconcept,
            self.catalog.subconcept_label(txn.subconcept_id),
            txn,
        );
        let division = txn
            .division
            .clone()
            .unwrap_or_else(|| NO_DIVISION_LABEL.to_string());
        record(&mut stats.by_division, division, txn);
        record(
            &mut stats.by_month,
            MonthKey::containing(txn.date).storage_key(),
            txn,
        );
    }

    fn finalize(&self, stats: &mut ReportStats, materialized_carryover: Decimal) {
        // A materialized carryover is already inside the period balance.
        stats.carryover_income = self
            .carryover
            .map(|record| (record.available() - materialized_carryover).max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO);
        stats.total_balance = stats.current_period_balance + stats.carryover_income;
        stats.total_transactions = stats.income_count + stats.expense_count;
        stats.average_income = average(stats.total_income, stats.income_count);
        stats.average_expense = average(stats.total_expenses, stats.expense_count);
    }

    fn weekly_breakdown(
        &self,
        transactions: &[Transaction],
        filters: &ReportFilters,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> WeeklyBreakdown {
        let mut weekly = WeeklyBreakdown {
            weeks: WeekBucketer::build_weeks(start, end),
            ..WeeklyBreakdown::default()
        };
        for txn in transactions
            .iter()
            .filter(|txn| txn.is_well_formed() && filters.criteria.matches(txn))
        {
            let Some(week) = WeekBucketer::assign(&weekly.weeks, txn.date) else {
                continue;
            };
            let bucket = if txn.is_income() {
                &mut weekly.income
            } else {
                &mut weekly.expense
            };
            bucket
                .entry(self.catalog.hierarchy_path(txn))
                .or_insert_with(PathWeeklyTotals::default)
                .add(week, txn.amount);
        }
        weekly
    }
}

fn record(breakdown: &mut Breakdown, key: String, txn: &Transaction) {
    breakdown.entry(key).or_default().record(txn);
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}
