use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::asset::EnrichedAssetLine;

/// Scenario / project selection applied to the working table.
/// An empty set means "no restriction" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFilter {
    #[serde(default)]
    pub scenarios: BTreeSet<String>,
    #[serde(default)]
    pub project_codes: BTreeSet<String>,
}

impl AssetFilter {
    pub fn new<S, P>(scenarios: S, project_codes: P) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            scenarios: scenarios.into_iter().map(Into::into).collect(),
            project_codes: project_codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.scenarios.is_empty() && self.project_codes.is_empty()
    }

    pub fn matches(&self, row: &EnrichedAssetLine) -> bool {
        (self.scenarios.is_empty() || self.scenarios.contains(&row.line.scenario))
            && (self.project_codes.is_empty()
                || self.project_codes.contains(&row.line.project_code))
    }

    /// Rows passing the filter, in their original order.
    pub fn apply<'a>(&self, rows: &'a [EnrichedAssetLine]) -> Vec<&'a EnrichedAssetLine> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::asset::{enrich, AssetLine};
    use rust_decimal_macros::dec;

    fn line(project: &str, scenario: &str) -> AssetLine {
        AssetLine {
            project_code: project.into(),
            program_name: String::new(),
            asset_id: format!("{project}-{scenario}"),
            asset_name: String::new(),
            asset_type: String::new(),
            process_area: String::new(),
            fab_location: String::new(),
            scenario: scenario.into(),
            quantity: dec!(1),
            unit_cost_usd: dec!(100),
            order_quarter: None,
            need_quarter: None,
            ramp_start_quarter: None,
            depreciation_years: None,
        }
    }

    #[test]
    fn test_unrestricted_filter_keeps_everything() {
        let rows = enrich(&[line("P1", "Base"), line("P2", "Upside")]);
        let filter = AssetFilter::default();
        assert!(filter.is_unrestricted());
        assert_eq!(filter.apply(&rows).len(), 2);
    }

    #[test]
    fn test_filter_intersects_dimensions() {
        let rows = enrich(&[
            line("P1", "Base"),
            line("P1", "Upside"),
            line("P2", "Base"),
        ]);
        let filter = AssetFilter::new(["Base"], ["P1"]);
        let kept = filter.apply(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].line.asset_id, "P1-Base");
    }
}
