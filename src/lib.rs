#![doc(test(attr(deny(warnings))))]

//! Report Core turns raw income and expense records into period reports:
//! totals, payment-status tallies, weekly breakdowns, month-to-month carryover
//! and running balances for categories that carry both income and expense.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::{
    services::CarryoverCheck,
    time::{Clock, FixedClock, SystemClock},
    Report, ReportEngine,
};
pub use domain::{
    CarryoverRecord, Catalog, MixedTreeRow, MonthKey, PaymentStatus, ReportFilters, ReportStats,
    Transaction, TransactionFilter, TransactionType,
};
pub use errors::{ReportError, StorageError};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Report Core tracing initialized.");
    });
}
