use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::common::MonthKey;

/// Balance rolled into `year`/`month` from the month before it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarryoverRecord {
    pub year: i32,
    pub month: u32,
    pub previous_year: i32,
    pub previous_month: u32,
    pub total_income: Decimal,
    pub previous_carryover: Decimal,
    pub total_paid_expenses: Decimal,
    pub carryover_balance: Decimal,
    pub computed_at: DateTime<Utc>,
}

impl CarryoverRecord {
    /// Builds the record for `target`, clamping a negative balance to zero.
    pub fn compute(
        target: MonthKey,
        total_income: Decimal,
        previous_carryover: Decimal,
        total_paid_expenses: Decimal,
        computed_at: DateTime<Utc>,
    ) -> Self {
        let source = target.previous();
        let carryover_balance =
            (total_income + previous_carryover - total_paid_expenses).max(Decimal::ZERO);
        Self {
            year: target.year,
            month: target.month,
            previous_year: source.year,
            previous_month: source.month,
            total_income,
            previous_carryover,
            total_paid_expenses,
            carryover_balance,
            computed_at,
        }
    }

    pub fn month_key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }

    pub fn source_month(&self) -> MonthKey {
        MonthKey {
            year: self.previous_year,
            month: self.previous_month,
        }
    }

    pub fn storage_key(&self) -> String {
        self.month_key().storage_key()
    }

    /// Carryover usable as income; anything non-positive counts as none.
    pub fn available(&self) -> Decimal {
        self.carryover_balance.max(Decimal::ZERO)
    }
}
