//! Month-to-month balance carryover.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    core::time::Clock,
    domain::{CarryoverRecord, MonthKey, PaymentStatus, Transaction},
    storage::{CarryoverStore, TransactionSource},
};

use super::ServiceResult;

/// Outcome of the automatic once-per-month carryover check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarryoverCheck {
    pub calculated: bool,
    pub data: Option<CarryoverRecord>,
    pub message: String,
}

/// Computes and persists the positive balance rolled from one month into the next.
pub struct CarryoverService<'a> {
    source: &'a dyn TransactionSource,
    store: &'a dyn CarryoverStore,
    clock: &'a dyn Clock,
}

impl<'a> CarryoverService<'a> {
    pub fn new(
        source: &'a dyn TransactionSource,
        store: &'a dyn CarryoverStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            source,
            store,
            clock,
        }
    }

    /// Computes the record for `target` from the month before it without persisting it.
    pub fn compute(&self, target: MonthKey) -> ServiceResult<CarryoverRecord> {
        let source_month = target.previous();
        let transactions = self.source.fetch_by_date_range(
            source_month.first_day(),
            source_month.last_day(),
            None,
        )?;

        let mut total_income = Decimal::ZERO;
        let mut total_paid_expenses = Decimal::ZERO;
        for txn in transactions.iter().filter(|txn| txn.is_well_formed()) {
            if txn.is_income() {
                // A materialized carryover is already counted through `previous_carryover`.
                if !txn.is_carryover {
                    total_income += txn.amount;
                }
            } else if txn.stored_status == PaymentStatus::Paid {
                total_paid_expenses += txn.amount;
            }
        }

        let previous_carryover = self.previous_carryover(source_month);
        let record = CarryoverRecord::compute(
            target,
            total_income,
            previous_carryover,
            total_paid_expenses,
            self.clock.now(),
        );
        debug!(
            month = %target,
            %total_income,
            %previous_carryover,
            %total_paid_expenses,
            carryover = %record.carryover_balance,
            "computed carryover"
        );
        Ok(record)
    }

    /// Recomputes and overwrites the record for `target`.
    pub fn calculate_and_save(&self, target: MonthKey) -> ServiceResult<CarryoverRecord> {
        let record = self.compute(target)?;
        self.store.put(&record)?;
        info!(month = %target, carryover = %record.carryover_balance, "saved carryover");
        Ok(record)
    }

    /// Returns the stored record for `target`, computing and storing it on first use.
    pub fn get_or_compute(&self, target: MonthKey) -> ServiceResult<CarryoverRecord> {
        if let Some(existing) = self.store.get(&target.storage_key())? {
            return Ok(existing);
        }
        let record = self.compute(target)?;
        let stored = self.store.put_if_absent(record)?;
        info!(month = %target, carryover = %stored.carryover_balance, "stored carryover");
        Ok(stored)
    }

    pub fn get_for_month(&self, target: MonthKey) -> ServiceResult<Option<CarryoverRecord>> {
        Ok(self.store.get(&target.storage_key())?)
    }

    /// Ensures the current month has a record. Never fails: problems come back as a
    /// warning message.
    pub fn check_and_calculate_if_needed(&self) -> CarryoverCheck {
        let month = MonthKey::containing(self.clock.today());
        match self.store.get(&month.storage_key()) {
            Ok(Some(existing)) => {
                return CarryoverCheck {
                    calculated: false,
                    data: Some(existing),
                    message: format!("Carryover for {month} already calculated"),
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(month = %month, error = %err, "carryover lookup failed during automatic check");
                return CarryoverCheck {
                    calculated: false,
                    data: None,
                    message: format!("Carryover for {month} could not be checked: {err}"),
                };
            }
        }

        match self.get_or_compute(month) {
            Ok(record) => CarryoverCheck {
                calculated: true,
                message: format!(
                    "Carryover for {month} calculated: {}",
                    record.carryover_balance
                ),
                data: Some(record),
            },
            Err(err) => {
                warn!(month = %month, error = %err, "automatic carryover calculation failed");
                CarryoverCheck {
                    calculated: false,
                    data: None,
                    message: format!("Carryover for {month} could not be calculated: {err}"),
                }
            }
        }
    }

    /// Synthetic income entry presenting `record` on the first day of its month.
    pub fn materialize(record: &CarryoverRecord) -> Option<Transaction> {
        let amount = record.available();
        if amount <= Decimal::ZERO {
            return None;
        }
        let mut txn = Transaction::income(amount, record.month_key().first_day())
            .paid_in_full()
            .with_created_at(record.computed_at);
        txn.is_carryover = true;
        Some(txn)
    }

    /// Carryover stored for the source month itself. Looks exactly one record back.
    fn previous_carryover(&self, source_month: MonthKey) -> Decimal {
        match self.store.get(&source_month.storage_key()) {
            Ok(Some(record)) => record.available(),
            Ok(None) => Decimal::ZERO,
            Err(err) => {
                warn!(month = %source_month, error = %err, "previous carryover unavailable, using zero");
                Decimal::ZERO
            }
        }
    }
}
