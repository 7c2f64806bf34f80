pub mod report_engine;
pub mod services;
pub mod time;

pub use report_engine::{Report, ReportEngine};
