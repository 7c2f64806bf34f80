use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{
        common::MonthKey,
        transaction::{PaymentStatus, Transaction, TransactionFilter},
    },
    errors::ReportError,
};

/// Reporting period plus the narrowing criteria applied to the transaction set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportFilters {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive: a transaction dated on `end_date` is in the period.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub criteria: TransactionFilter,
}

impl ReportFilters {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if end < start {
            return Err(ReportError::InvalidInput(
                "report end date must not precede its start date".into(),
            ));
        }
        Ok(Self {
            start_date: Some(start),
            end_date: Some(end),
            criteria: TransactionFilter::default(),
        })
    }

    pub fn for_month(month: MonthKey) -> Self {
        Self {
            start_date: Some(month.first_day()),
            end_date: Some(month.last_day()),
            criteria: TransactionFilter::default(),
        }
    }

    pub fn with_criteria(mut self, criteria: TransactionFilter) -> Self {
        self.criteria = criteria;
        self
    }

    /// Both ends of the period are known.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn in_period(&self, date: NaiveDate) -> bool {
        let after_start = self.start_date.map_or(true, |start| date >= start);
        let before_end = self.end_date.map_or(true, |end| date <= end);
        after_start && before_end
    }

    pub fn precedes_start(&self, date: NaiveDate) -> bool {
        self.start_date.is_some_and(|start| date < start)
    }

    /// The calendar month the period belongs to, when start and end share one.
    pub fn report_month(&self) -> Option<MonthKey> {
        let (start, end) = self.range()?;
        let month = MonthKey::containing(start);
        month.contains(end).then_some(month)
    }
}

/// Per-status figures. `amount` and `balance` carry bucket-specific meaning:
/// paid records the full amount, partial the settled part against its outstanding
/// balance, unpaid the outstanding amount in both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusTally {
    pub count: usize,
    pub amount: Decimal,
    pub balance: Decimal,
    pub carryover: Decimal,
}

impl StatusTally {
    pub fn record(&mut self, status: PaymentStatus, txn: &Transaction) {
        self.count += 1;
        match status {
            PaymentStatus::Paid => {
                self.amount += txn.amount;
            }
            PaymentStatus::Partial => {
                self.amount += txn.total_paid;
                self.balance += txn.balance;
            }
            PaymentStatus::Unpaid => {
                let outstanding = txn.outstanding();
                self.amount += outstanding;
                self.balance += outstanding;
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentStatusTallies {
    pub paid: StatusTally,
    pub partial: StatusTally,
    pub unpaid: StatusTally,
    /// Unpaid items dated before the report start.
    pub prior_pending: StatusTally,
}

impl PaymentStatusTallies {
    pub fn bucket_mut(&mut self, status: PaymentStatus) -> &mut StatusTally {
        match status {
            PaymentStatus::Paid => &mut self.paid,
            PaymentStatus::Partial => &mut self.partial,
            PaymentStatus::Unpaid => &mut self.unpaid,
        }
    }

    pub fn bucket(&self, status: PaymentStatus) -> &StatusTally {
        match status {
            PaymentStatus::Paid => &self.paid,
            PaymentStatus::Partial => &self.partial,
            PaymentStatus::Unpaid => &self.unpaid,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BreakdownEntry {
    pub income: Decimal,
    pub expense: Decimal,
    /// Net of the bucket: income minus expense.
    pub total: Decimal,
    pub count: usize,
    pub paid: Decimal,
    pub pending: Decimal,
}

impl BreakdownEntry {
    pub fn record(&mut self, txn: &Transaction) {
        if txn.is_income() {
            self.income += txn.amount;
        } else {
            self.expense += txn.amount;
        }
        self.total = self.income - self.expense;
        self.count += 1;
        let (settled, outstanding) = txn.settlement();
        self.paid += settled;
        self.pending += outstanding;
    }
}

pub type Breakdown = BTreeMap<String, BreakdownEntry>;

/// A Monday–Sunday week as shown in a monthly report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekDescriptor {
    /// 1-based position within the reported month.
    pub sequence_number: u32,
    /// Absolute ISO week-of-year, for display.
    pub iso_week: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_boundary: NaiveDate,
    pub end_boundary: NaiveDate,
}

impl WeekDescriptor {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_boundary && date <= self.end_boundary
    }

    pub fn clamped_days(&self) -> i64 {
        (self.end_boundary - self.start_boundary).num_days() + 1
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PathWeeklyTotals {
    pub weeks: BTreeMap<u32, Decimal>,
    pub total: Decimal,
}

impl PathWeeklyTotals {
    pub fn add(&mut self, week: u32, amount: Decimal) {
        *self.weeks.entry(week).or_default() += amount;
        self.total += amount;
    }

    pub fn week(&self, week: u32) -> Decimal {
        self.weeks.get(&week).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyBreakdown {
    pub weeks: Vec<WeekDescriptor>,
    /// Keyed by `category > concept > subconcept`.
    pub income: BTreeMap<String, PathWeeklyTotals>,
    pub expense: BTreeMap<String, PathWeeklyTotals>,
}

/// Aggregate produced fresh for every report request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportStats {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub income_count: usize,
    pub expense_count: usize,
    pub total_transactions: usize,
    pub average_income: Decimal,
    pub average_expense: Decimal,
    pub current_period_balance: Decimal,
    pub carryover_income: Decimal,
    pub total_balance: Decimal,
    /// Outstanding amount of unpaid expenses dated before the period.
    pub carryover_balance: Decimal,
    pub payment_status_income: PaymentStatusTallies,
    pub payment_status_expense: PaymentStatusTallies,
    pub by_category: Breakdown,
    pub by_concept: Breakdown,
    pub by_subconcept: Breakdown,
    pub by_division: Breakdown,
    pub by_provider: Breakdown,
    pub by_month: Breakdown,
    pub weekly_breakdown: WeeklyBreakdown,
    pub skipped_records: usize,
}

/// Running balance of one category/concept pair within one week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixedTreeRow {
    pub week_number: u32,
    pub general_id: Option<Uuid>,
    pub concept_id: Option<Uuid>,
    pub category_label: String,
    pub concept_label: String,
    pub carryover_in: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub today_income: Decimal,
    pub today_expense: Decimal,
    pub running_balance_to_date: Decimal,
    pub transaction_count: usize,
    pub transactions: Vec<Uuid>,
}
