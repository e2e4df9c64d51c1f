pub mod assumptions;
pub mod error;
pub mod projection;
pub mod statement;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use error::ForecastError;
pub use types::*;

/// Standard result type for all forecast operations
pub type ForecastResult<T> = Result<T, ForecastError>;
