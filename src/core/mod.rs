//! Core abstractions shared by the analytics components and storage

pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod models;
pub mod period;
pub mod storage;
pub mod wma;

// Re-export main types for cleaner imports
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AnalyzerError, ErrorKind};
pub use models::{
    CategoryAnomaly, CategoryPeriodStats, CategoryStats, PeriodStats, RecurringPattern,
    RecurringPayment, StatisticsReport, Transaction, TransactionType,
};
pub use period::TimePeriod;
pub use storage::{StatisticsRequest, TransactionStorage};
