pub mod carryover;
pub mod category;
pub mod common;
pub mod report;
pub mod transaction;

pub use carryover::CarryoverRecord;
pub use category::{Catalog, ReferenceEntry, ReferenceKind};
pub use common::{Identifiable, MonthKey, NamedEntity};
pub use report::{
    BreakdownEntry, MixedTreeRow, PaymentStatusTallies, ReportFilters, ReportStats, StatusTally,
    WeekDescriptor, WeeklyBreakdown,
};
pub use transaction::{PaymentStatus, Transaction, TransactionFilter, TransactionType};
