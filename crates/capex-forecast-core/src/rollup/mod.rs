pub mod capex;

pub use capex::{
    capex_by_asset_type, capex_by_program, capex_by_scenario, portfolio_kpis, quarterly_capex,
    summarize, CapexSummary, PortfolioKpis, ProgramCapex, QuarterlyCapexRow,
};
