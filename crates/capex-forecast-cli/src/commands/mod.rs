pub mod depreciation;
pub mod register;
pub mod rollup;
pub mod valuation;
