pub mod cashflows;

pub use cashflows::{
    project_cashflows, CashflowAssumptions, ProjectCashflowResult, YearCashflow,
    DEFAULT_BENEFIT_MULTIPLE, DEFAULT_DISCOUNT_RATE,
};
