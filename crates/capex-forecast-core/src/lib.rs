pub mod error;
pub mod period;
pub mod register;
pub mod time_value;
pub mod types;

#[cfg(feature = "rollup")]
pub mod rollup;

#[cfg(feature = "depreciation")]
pub mod depreciation;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "model")]
pub mod model;

#[cfg(feature = "model")]
pub mod cache;

pub use error::CapexError;
pub use types::*;

/// Standard result type for all capex-forecast operations
pub type CapexResult<T> = Result<T, CapexError>;
