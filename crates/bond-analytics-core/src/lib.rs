pub mod cashflow;
pub mod error;
pub mod pricing;
pub mod risk;
pub mod types;
pub mod yields;

pub use error::BondAnalyticsError;
pub use types::*;

/// Standard result type for all bond-analytics operations
pub type BondAnalyticsResult<T> = Result<T, BondAnalyticsError>;
