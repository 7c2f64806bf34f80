pub mod carryover_service;
pub mod stats_service;
pub mod tree_service;
pub mod week_service;

pub use carryover_service::{CarryoverCheck, CarryoverService};
pub use stats_service::{ReportStatsAggregator, TransactionClass};
pub use tree_service::MixedTreeComparator;
pub use week_service::WeekBucketer;

use crate::errors::StorageError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
