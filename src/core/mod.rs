//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod log;
pub mod monthly;
pub mod price;
pub mod query;

// Re-export main types for cleaner imports
pub use monthly::{MonthlyRecord, MonthlyReport};
pub use price::{DailyPriceSeries, PriceField, PriceHistory, PriceSource};
pub use query::{INDEX_SYMBOL, Query, QueryError, ReportService};
