use serde::{Deserialize, Serialize};

use crate::depreciation::{
    annual_dep_by_program, depreciation_schedule, quarterly_depreciation,
    DepreciationScheduleEntry, ProgramDepreciationRow, QuarterlyDepreciationRow,
};
use crate::register::{
    enrich_with_report, AssetFilter, AssetLine, EnrichedAssetLine, EnrichmentReport,
};
use crate::rollup::{quarterly_capex, summarize, CapexSummary, QuarterlyCapexRow};
use crate::types::ComputationOutput;
use crate::valuation::{project_cashflows, CashflowAssumptions, ProjectCashflowResult};
use crate::CapexResult;

/// Every derived table built from one asset register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModel {
    pub rows: Vec<EnrichedAssetLine>,
    pub report: EnrichmentReport,
    pub summary: CapexSummary,
    pub quarterly_capex: Vec<QuarterlyCapexRow>,
    pub depreciation_schedule: Vec<DepreciationScheduleEntry>,
    pub annual_dep_by_program: Vec<ProgramDepreciationRow>,
    pub quarterly_depreciation: Vec<QuarterlyDepreciationRow>,
}

impl ForecastModel {
    pub fn build(lines: &[AssetLine]) -> Self {
        let (rows, report) = enrich_with_report(lines);
        let summary = summarize(&rows);
        let quarterly_capex = quarterly_capex(&rows);
        let depreciation_schedule = depreciation_schedule(&rows);
        let annual_dep_by_program = annual_dep_by_program(&depreciation_schedule);
        let quarterly_depreciation = quarterly_depreciation(&rows);

        tracing::info!(
            rows = rows.len(),
            quarters = quarterly_capex.len(),
            schedule_entries = depreciation_schedule.len(),
            "forecast model built"
        );

        Self {
            rows,
            report,
            summary,
            quarterly_capex,
            depreciation_schedule,
            annual_dep_by_program,
            quarterly_depreciation,
        }
    }

    /// Cashflow, NPV and IRR for one project. Valuation always runs on the
    /// full register, independent of any view filter.
    pub fn project_cashflows(
        &self,
        project_code: &str,
        assumptions: &CashflowAssumptions,
    ) -> CapexResult<ComputationOutput<ProjectCashflowResult>> {
        project_cashflows(&self.rows, project_code, assumptions)
    }

    pub fn filtered(&self, filter: &AssetFilter) -> Vec<&EnrichedAssetLine> {
        filter.apply(&self.rows)
    }

    /// Unparsed-label counts over the filtered rows only.
    pub fn filtered_report(&self, filter: &AssetFilter) -> EnrichmentReport {
        if filter.is_unrestricted() {
            return self.report.clone();
        }
        EnrichmentReport::from_rows(self.filtered(filter))
    }

    /// Summary over the filtered rows.
    pub fn filtered_summary(&self, filter: &AssetFilter) -> CapexSummary {
        summarize(self.filtered(filter))
    }

    /// Quarterly rollup over the filtered rows. The precomputed table is
    /// reused when only scenarios are restricted.
    pub fn filtered_quarterly_capex(&self, filter: &AssetFilter) -> Vec<QuarterlyCapexRow> {
        if !filter.project_codes.is_empty() {
            return quarterly_capex(self.filtered(filter));
        }
        self.quarterly_capex
            .iter()
            .filter(|r| filter.scenarios.is_empty() || filter.scenarios.contains(&r.scenario))
            .cloned()
            .collect()
    }

    pub fn filtered_depreciation_schedule(
        &self,
        filter: &AssetFilter,
    ) -> Vec<DepreciationScheduleEntry> {
        if filter.is_unrestricted() {
            return self.depreciation_schedule.clone();
        }
        depreciation_schedule(self.filtered(filter))
    }

    /// Program/year depreciation over the filtered rows. Schedule entries
    /// carry no scenario, so a scenario filter rebuilds from the rows.
    pub fn filtered_dep_by_program(&self, filter: &AssetFilter) -> Vec<ProgramDepreciationRow> {
        if !filter.scenarios.is_empty() {
            return annual_dep_by_program(&self.filtered_depreciation_schedule(filter));
        }
        self.annual_dep_by_program
            .iter()
            .filter(|r| {
                filter.project_codes.is_empty() || filter.project_codes.contains(&r.project_code)
            })
            .cloned()
            .collect()
    }

    pub fn filtered_quarterly_depreciation(
        &self,
        filter: &AssetFilter,
    ) -> Vec<QuarterlyDepreciationRow> {
        if !filter.project_codes.is_empty() {
            return quarterly_depreciation(self.filtered(filter));
        }
        self.quarterly_depreciation
            .iter()
            .filter(|r| filter.scenarios.is_empty() || filter.scenarios.contains(&r.scenario))
            .cloned()
            .collect()
    }
}
