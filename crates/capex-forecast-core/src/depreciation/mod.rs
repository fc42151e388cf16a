pub mod amortization;
pub mod schedule;

pub use amortization::{inflation_adjust, nbv_schedule, rolling_depreciation, NbvRow};
pub use schedule::{
    annual_dep_by_program, annual_dep_by_year, depreciation_schedule, quarterly_depreciation,
    DepreciationScheduleEntry, ProgramDepreciationRow, QuarterlyDepreciationRow,
};
